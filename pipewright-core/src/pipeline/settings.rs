//! Typed node settings.
//!
//! A node's config map is projected into a [`NodeSettings`] value tagged by
//! category before anything downstream (code generation, heuristics) looks at
//! it. Projection fails only for configurations that validation also rejects.

use super::node::Node;
use crate::error::{PipelineError, Result};
use crate::registry::{Category, NodeTypeSpec};
use std::fmt;
use std::str::FromStr;

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Configuration spelling.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!("unknown {} '{}'", stringify!($name), other)),
                }
            }
        }
    };
}

string_enum!(
    /// How a target writes its input.
    LoadStrategy {
        /// Insert rows.
        Append => "append",
        /// Truncate, then insert.
        Overwrite => "overwrite",
        /// Merge on key columns.
        Merge => "merge",
        /// Insert, updating rows that conflict on key columns.
        Upsert => "upsert",
    }
);

impl LoadStrategy {
    /// Whether the strategy matches rows on `key_columns`.
    pub fn needs_keys(&self) -> bool {
        matches!(self, Self::Merge | Self::Upsert)
    }
}

string_enum!(
    /// Kind of data quality rule.
    QualityRule {
        /// Share of non-null values.
        Completeness => "completeness",
        /// Share of distinct values.
        Uniqueness => "uniqueness",
        /// Share of values inside a range expression.
        Range => "range",
        /// Share of values with a matching parent row.
        Referential => "referential",
        /// Share of values matching a format predicate.
        Format => "format",
        /// Share of rows satisfying an arbitrary predicate.
        Custom => "custom",
    }
);

impl QualityRule {
    /// Whether the rule is evaluated from the `expression` field.
    pub fn needs_expression(&self) -> bool {
        !matches!(self, Self::Completeness | Self::Uniqueness)
    }
}

string_enum!(
    /// What a failing quality check does.
    QualityMode {
        /// Report only.
        Warn => "warn",
        /// Stop the run.
        Block => "block",
    }
);

string_enum!(
    /// Format of a file source.
    FileFormat {
        /// Comma-separated values.
        Csv => "csv",
        /// Apache Parquet.
        Parquet => "parquet",
        /// Newline-delimited JSON.
        Json => "json",
    }
);

/// Where a source reads from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSettings {
    /// Database table.
    Table {
        /// Connection name.
        connection: String,
        /// Optional schema qualifier.
        schema: Option<String>,
        /// Table name.
        table: String,
    },
    /// File on disk or object storage.
    File {
        /// File path or URI.
        path: String,
        /// File format.
        format: FileFormat,
    },
    /// Message stream.
    Stream {
        /// Connection name.
        connection: String,
        /// Topic name.
        topic: String,
    },
}

/// How a transform derives its output.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformSettings {
    /// Keep rows matching a predicate.
    Filter {
        /// SQL predicate.
        condition: String,
    },
    /// Group and aggregate.
    Aggregate {
        /// Grouping columns.
        group_by: Vec<String>,
        /// Aggregate expressions.
        aggregates: Vec<String>,
        /// Optional pre-aggregation predicate.
        condition: Option<String>,
    },
    /// Raw SQL with input placeholders.
    Sql {
        /// Query text.
        query: String,
    },
}

/// A data quality assertion.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityCheckSettings {
    /// Rule kind.
    pub rule: QualityRule,
    /// Column under test.
    pub column: String,
    /// Predicate for expression-based rules.
    pub expression: Option<String>,
    /// Minimum pass rate in percent.
    pub threshold: f64,
    /// Failure behaviour.
    pub mode: QualityMode,
}

/// Where and how a target writes.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSettings {
    /// Connection name.
    pub connection: String,
    /// Optional schema qualifier.
    pub schema: Option<String>,
    /// Table name.
    pub table: String,
    /// Write strategy.
    pub load_strategy: LoadStrategy,
    /// Match columns for merge and upsert.
    pub key_columns: Vec<String>,
    /// Columns updated on conflict.
    pub columns: Vec<String>,
}

/// Node settings tagged by category.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeSettings {
    /// Source settings.
    Source(SourceSettings),
    /// Transform settings.
    Transform(TransformSettings),
    /// Quality check settings.
    QualityCheck(QualityCheckSettings),
    /// Target settings.
    Target(TargetSettings),
}

impl NodeSettings {
    /// Project a node's configuration through its type spec.
    ///
    /// Defaults declared by the spec fill absent fields.
    pub fn project(node: &Node, spec: &NodeTypeSpec) -> Result<Self> {
        let fields = Fields { node, spec };
        match spec.category {
            Category::Source => fields.source().map(Self::Source),
            Category::Transform => fields.transform().map(Self::Transform),
            Category::QualityCheck => fields.quality_check().map(Self::QualityCheck),
            Category::Target => fields.target().map(Self::Target),
        }
    }

    /// Category of the settings.
    pub fn category(&self) -> Category {
        match self {
            Self::Source(_) => Category::Source,
            Self::Transform(_) => Category::Transform,
            Self::QualityCheck(_) => Category::QualityCheck,
            Self::Target(_) => Category::Target,
        }
    }
}

struct Fields<'a> {
    node: &'a Node,
    spec: &'a NodeTypeSpec,
}

impl Fields<'_> {
    fn invalid(&self, field: &str, cause: impl Into<String>) -> PipelineError {
        PipelineError::InvalidConfigValue {
            node_id: self.node.id.clone(),
            field: field.to_string(),
            cause: cause.into(),
        }
    }

    fn has(&self, field: &str) -> bool {
        self.node.has_value(self.spec, field)
    }

    fn text(&self, field: &str) -> Result<String> {
        self.opt_text(field)?
            .ok_or_else(|| self.invalid(field, "value is required"))
    }

    fn opt_text(&self, field: &str) -> Result<Option<String>> {
        match self.node.effective(self.spec, field) {
            None => Ok(None),
            Some(value) if value.is_empty() => Ok(None),
            Some(value) => value
                .as_str()
                .map(|s| Some(s.trim().to_string()))
                .ok_or_else(|| {
                    self.invalid(field, format!("expected string, got {}", value.kind()))
                }),
        }
    }

    fn list(&self, field: &str) -> Result<Vec<String>> {
        match self.node.effective(self.spec, field) {
            None => Ok(Vec::new()),
            Some(value) => value
                .as_list()
                .map(|items| {
                    items
                        .iter()
                        .map(|s| s.trim())
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .ok_or_else(|| self.invalid(field, format!("expected list, got {}", value.kind()))),
        }
    }

    fn parsed<T: FromStr<Err = String>>(&self, field: &str) -> Result<Option<T>> {
        self.opt_text(field)?
            .map(|s| s.parse().map_err(|e: String| self.invalid(field, e)))
            .transpose()
    }

    fn source(&self) -> Result<SourceSettings> {
        if self.has("path") {
            Ok(SourceSettings::File {
                path: self.text("path")?,
                format: self.parsed("format")?.unwrap_or(FileFormat::Csv),
            })
        } else if self.has("topic") {
            Ok(SourceSettings::Stream {
                connection: self.opt_text("connection")?.unwrap_or_default(),
                topic: self.text("topic")?,
            })
        } else {
            Ok(SourceSettings::Table {
                connection: self.opt_text("connection")?.unwrap_or_default(),
                schema: self.opt_text("schema")?,
                table: self.text("table")?,
            })
        }
    }

    fn transform(&self) -> Result<TransformSettings> {
        if self.has("query") {
            Ok(TransformSettings::Sql {
                query: self.text("query")?,
            })
        } else if self.has("aggregates") || self.has("group_by") {
            Ok(TransformSettings::Aggregate {
                group_by: self.list("group_by")?,
                aggregates: self.list("aggregates")?,
                condition: self.opt_text("condition")?,
            })
        } else if self.has("condition") {
            Ok(TransformSettings::Filter {
                condition: self.text("condition")?,
            })
        } else {
            Err(self.invalid(
                "query",
                format!(
                    "transform type '{}' has no condition, aggregates or query to render",
                    self.spec.id
                ),
            ))
        }
    }

    fn quality_check(&self) -> Result<QualityCheckSettings> {
        let rule: QualityRule = self
            .parsed("rule")?
            .ok_or_else(|| self.invalid("rule", "value is required"))?;
        let expression = self.opt_text("expression")?;
        if rule.needs_expression() && expression.is_none() {
            return Err(self.invalid(
                "expression",
                format!("rule '{}' requires an expression", rule),
            ));
        }

        let threshold = match self.node.effective(self.spec, "threshold") {
            None => 100.0,
            Some(value) => value.as_f64().ok_or_else(|| {
                self.invalid("threshold", format!("expected number, got {}", value.kind()))
            })?,
        };
        if !(0.0..=100.0).contains(&threshold) {
            return Err(self.invalid(
                "threshold",
                format!("{} is outside 0..=100", threshold),
            ));
        }

        Ok(QualityCheckSettings {
            rule,
            column: self.text("column")?,
            expression,
            threshold,
            mode: self.parsed("mode")?.unwrap_or(QualityMode::Warn),
        })
    }

    fn target(&self) -> Result<TargetSettings> {
        let load_strategy = self.parsed("load_strategy")?.unwrap_or(LoadStrategy::Append);
        let key_columns = self.list("key_columns")?;
        if load_strategy.needs_keys() && key_columns.is_empty() {
            return Err(self.invalid(
                "key_columns",
                format!("load strategy '{}' requires key columns", load_strategy),
            ));
        }

        Ok(TargetSettings {
            connection: self.opt_text("connection")?.unwrap_or_default(),
            schema: self.opt_text("schema")?,
            table: self.text("table")?,
            load_strategy,
            key_columns,
            columns: self.list("columns")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NodeTypeRegistry;

    fn project(node: &Node) -> Result<NodeSettings> {
        let registry = NodeTypeRegistry::builtin();
        NodeSettings::project(node, registry.lookup(&node.node_type).unwrap())
    }

    #[test]
    fn table_source() {
        let node = Node::new("A", "source-pg")
            .with_config("connection", "warehouse")
            .with_config("schema", "sales")
            .with_config("table", "orders");
        assert_eq!(
            project(&node).unwrap(),
            NodeSettings::Source(SourceSettings::Table {
                connection: "warehouse".to_string(),
                schema: Some("sales".to_string()),
                table: "orders".to_string(),
            })
        );
    }

    #[test]
    fn file_source_uses_default_format() {
        let node = Node::new("F", "source-file").with_config("path", "/data/events.csv");
        match project(&node).unwrap() {
            NodeSettings::Source(SourceSettings::File { format, .. }) => {
                assert_eq!(format, FileFormat::Csv)
            }
            other => panic!("unexpected settings {:?}", other),
        }
    }

    #[test]
    fn transform_shapes() {
        let filter =
            Node::new("B", "transform-filter").with_config("condition", "status = 'active'");
        assert!(matches!(
            project(&filter).unwrap(),
            NodeSettings::Transform(TransformSettings::Filter { .. })
        ));

        let agg = Node::new("G", "transform-aggregate")
            .with_config("group_by", vec!["region", " "])
            .with_config("aggregates", vec!["SUM(amount) AS total"]);
        match project(&agg).unwrap() {
            NodeSettings::Transform(TransformSettings::Aggregate { group_by, condition, .. }) => {
                assert_eq!(group_by, vec!["region".to_string()]);
                assert!(condition.is_none());
            }
            other => panic!("unexpected settings {:?}", other),
        }
    }

    #[test]
    fn quality_check_defaults() {
        let node = Node::new("Q", "quality-check")
            .with_config("rule", "completeness")
            .with_config("column", "email");
        match project(&node).unwrap() {
            NodeSettings::QualityCheck(check) => {
                assert_eq!(check.rule, QualityRule::Completeness);
                assert_eq!(check.threshold, 100.0);
                assert_eq!(check.mode, QualityMode::Warn);
            }
            other => panic!("unexpected settings {:?}", other),
        }
    }

    #[test]
    fn expression_rules_need_expression() {
        let node = Node::new("Q", "quality-check")
            .with_config("rule", "range")
            .with_config("column", "price");
        let err = project(&node).unwrap_err();
        assert!(err.to_string().contains("'expression'"));
    }

    #[test]
    fn target_keys_required_for_merge() {
        let node = Node::new("C", "target-pg")
            .with_config("connection", "warehouse")
            .with_config("table", "daily_orders")
            .with_config("load_strategy", "merge");
        let err = project(&node).unwrap_err();
        assert!(err.to_string().contains("key_columns"));

        let node = node.with_config("key_columns", vec!["order_id"]);
        match project(&node).unwrap() {
            NodeSettings::Target(target) => {
                assert_eq!(target.load_strategy, LoadStrategy::Merge);
                assert_eq!(target.table, "daily_orders");
                assert_eq!(target.schema, None);
            }
            other => panic!("unexpected settings {:?}", other),
        }
    }

    #[test]
    fn enum_parse_errors_name_the_field() {
        let node = Node::new("C", "target-ch")
            .with_config("table", "t")
            .with_config("load_strategy", "replace");
        let err = project(&node).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidConfigValue { ref field, .. } if field == "load_strategy"
        ));
    }
}
