//! SQL chain emitter.
//!
//! Every non-target node becomes a temporary view named after its relation
//! name; every target becomes a terminal write statement. Views come first, in
//! topological order, followed by the writes in the same order:
//!
//! ```sql
//! -- B: Active only [transform-filter]
//! CREATE OR REPLACE TEMPORARY VIEW pw_B AS
//! SELECT * FROM pw_A WHERE status = 'active';
//!
//! -- C: Daily orders [target-pg] append via warehouse
//! INSERT INTO daily_orders
//! SELECT * FROM pw_B;
//! ```
//!
//! Free text (names, labels, check expressions) only ever appears inside
//! single-line comments built by [`comment`].

use super::naming::{quote_ident, relation_names, table_ref};
use super::{ArtifactKind, Emitter};
use pipewright_core::pipeline::{
    LoadStrategy, NodeSettings, QualityCheckSettings, QualityRule, SourceSettings, TargetSettings,
    TransformSettings,
};
use pipewright_core::{Node, NodeTypeRegistry, Pipeline, Result};
use std::fmt::Write;

/// Emits an SQL statement chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlEmitter;

impl Emitter for SqlEmitter {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Sql
    }

    fn emit(&self, pipeline: &Pipeline, registry: &NodeTypeRegistry) -> Result<String> {
        let order = pipeline.topological_order()?;
        let names = relation_names(pipeline);

        let mut views = Vec::new();
        let mut writes = Vec::new();

        for id in &order {
            let node = pipeline.require_node(id.as_str())?;
            let spec = registry.lookup(&node.node_type)?;
            let settings = NodeSettings::project(node, spec)?;

            // Predecessors are already sorted by ID.
            let inputs = Inputs(
                pipeline
                    .predecessors(id.as_str())
                    .filter_map(|p| names.get(p).map(String::as_str))
                    .collect(),
            );
            let name = names.get(id).map(String::as_str).unwrap_or(id.as_str());
            let header = format!("{}: {} [{}]", node.id, node.display_name(), node.node_type);

            match settings {
                NodeSettings::Source(source) => {
                    views.push(view(&comment(&header), name, &render_source(&source)));
                }
                NodeSettings::Transform(transform) => {
                    let body = render_transform(&transform, &inputs);
                    views.push(view(&comment(&header), name, &body));
                }
                NodeSettings::QualityCheck(check) => {
                    let comments = render_check_comments(node, &check, &inputs);
                    views.push(view(
                        &format!("{}\n{}", comment(&header), comments),
                        name,
                        &format!("SELECT * FROM {}", inputs.from_item(None)),
                    ));
                }
                NodeSettings::Target(target) => {
                    writes.push(render_write(&header, &target, &inputs));
                }
            }
        }

        let mut out = String::new();
        // Writing to a String cannot fail.
        let title = format!("Pipeline: {} ({})", pipeline.name(), pipeline.id());
        let _ = writeln!(out, "{}", comment(&title));
        let _ = writeln!(out, "{}", comment("Generated by pipewright. Do not edit."));
        for block in views.iter().chain(writes.iter()) {
            out.push('\n');
            out.push_str(block);
        }

        tracing::trace!(
            pipeline_id = %pipeline.id(),
            views = views.len(),
            writes = writes.len(),
            "SQL chain emitted"
        );
        Ok(out)
    }
}

/// Relation names of a node's inputs, in ascending node ID order.
struct Inputs<'a>(Vec<&'a str>);

impl Inputs<'_> {
    /// A single input's name, or the UNION ALL of every input as a subquery.
    fn relation(&self) -> String {
        match self.0.as_slice() {
            [single] => (*single).to_string(),
            many => {
                let selects: Vec<String> =
                    many.iter().map(|name| format!("SELECT * FROM {}", name)).collect();
                format!("({})", selects.join(" UNION ALL "))
            }
        }
    }

    /// Inputs usable in a FROM clause, aliased when an alias is given or
    /// required.
    fn from_item(&self, alias: Option<&str>) -> String {
        match (self.0.len(), alias) {
            (1, None) => self.relation(),
            (_, None) => format!("{} AS input", self.relation()),
            (_, Some(alias)) => format!("{} AS {}", self.relation(), alias),
        }
    }
}

/// A single-line SQL comment. Line breaks in `text` become spaces.
fn comment(text: &str) -> String {
    let flat: String = text
        .chars()
        .map(|c| if matches!(c, '\r' | '\n') { ' ' } else { c })
        .collect();
    format!("-- {}", flat)
}

fn view(header: &str, name: &str, body: &str) -> String {
    format!(
        "{}\nCREATE OR REPLACE TEMPORARY VIEW {} AS\n{};\n",
        header, name, body
    )
}

fn render_source(source: &SourceSettings) -> String {
    match source {
        SourceSettings::Table { schema, table, .. } => {
            format!("SELECT * FROM {}", table_ref(schema.as_deref(), table))
        }
        SourceSettings::File { path, .. } => format!("SELECT * FROM {}", quote_literal(path)),
        SourceSettings::Stream { topic, .. } => format!("SELECT * FROM {}", quote_ident(topic)),
    }
}

fn render_transform(transform: &TransformSettings, inputs: &Inputs<'_>) -> String {
    match transform {
        TransformSettings::Filter { condition } => {
            format!("SELECT * FROM {} WHERE {}", inputs.from_item(None), condition)
        }
        TransformSettings::Aggregate {
            group_by,
            aggregates,
            condition,
        } => {
            let columns: Vec<&str> = group_by
                .iter()
                .chain(aggregates.iter())
                .map(String::as_str)
                .collect();
            let mut sql = format!(
                "SELECT {} FROM {}",
                columns.join(", "),
                inputs.from_item(None)
            );
            if let Some(condition) = condition {
                let _ = write!(sql, " WHERE {}", condition);
            }
            if !group_by.is_empty() {
                let _ = write!(sql, " GROUP BY {}", group_by.join(", "));
            }
            sql
        }
        TransformSettings::Sql { query } => substitute_inputs(query, inputs),
    }
}

/// Replace `{{input}}` and `{{input_N}}` (1-based) placeholders.
fn substitute_inputs(query: &str, inputs: &Inputs<'_>) -> String {
    let mut sql = query.trim().trim_end_matches(';').trim_end().to_string();
    // Highest index first so that `{{input_1}}` never matches inside `{{input_10}}`.
    for (i, name) in inputs.0.iter().enumerate().rev() {
        sql = sql.replace(&format!("{{{{input_{}}}}}", i + 1), name);
    }
    sql.replace("{{input}}", &inputs.from_item(None))
}

fn render_check_comments(node: &Node, check: &QualityCheckSettings, inputs: &Inputs<'_>) -> String {
    let pass = match check.rule {
        QualityRule::Completeness => format!("COUNT({})", check.column),
        QualityRule::Uniqueness => format!("COUNT(DISTINCT {})", check.column),
        QualityRule::Range
        | QualityRule::Referential
        | QualityRule::Format
        | QualityRule::Custom => format!(
            "SUM(CASE WHEN {} THEN 1 ELSE 0 END)",
            check.expression.as_deref().unwrap_or("TRUE")
        ),
    };

    let summary = format!(
        "check {}: {} on {} must pass >= {}% (mode: {})",
        node.id, check.rule, check.column, check.threshold, check.mode
    );
    let metric = format!(
        "metric: SELECT 100.0 * {} / NULLIF(COUNT(*), 0) AS pass_rate FROM {};",
        pass,
        inputs.from_item(None)
    );
    format!("{}\n{}", comment(&summary), comment(&metric))
}

fn render_write(header: &str, target: &TargetSettings, inputs: &Inputs<'_>) -> String {
    let table = table_ref(target.schema.as_deref(), &target.table);
    let mut title = format!("{} {}", header, target.load_strategy);
    if !target.connection.is_empty() {
        let _ = write!(title, " via {}", target.connection);
    }
    let mut sql = comment(&title);
    sql.push('\n');

    match target.load_strategy {
        LoadStrategy::Append => {
            let _ = writeln!(
                sql,
                "INSERT INTO {}\nSELECT * FROM {};",
                table,
                inputs.from_item(None)
            );
        }
        LoadStrategy::Overwrite => {
            let _ = writeln!(
                sql,
                "TRUNCATE TABLE {};\nINSERT INTO {}\nSELECT * FROM {};",
                table,
                table,
                inputs.from_item(None)
            );
        }
        LoadStrategy::Merge => {
            let on: Vec<String> = target
                .key_columns
                .iter()
                .map(|k| quote_ident(k))
                .map(|k| format!("t.{} = s.{}", k, k))
                .collect();
            let update = if target.columns.is_empty() {
                "*".to_string()
            } else {
                target
                    .columns
                    .iter()
                    .map(|c| quote_ident(c))
                    .map(|c| format!("{} = s.{}", c, c))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            let _ = writeln!(
                sql,
                "MERGE INTO {} AS t\nUSING {}\nON {}\n\
                 WHEN MATCHED THEN UPDATE SET {}\nWHEN NOT MATCHED THEN INSERT *;",
                table,
                inputs.from_item(Some("s")),
                on.join(" AND "),
                update
            );
        }
        LoadStrategy::Upsert => {
            let action = if target.columns.is_empty() {
                "DO NOTHING".to_string()
            } else {
                let sets: Vec<String> = target
                    .columns
                    .iter()
                    .map(|c| quote_ident(c))
                    .map(|c| format!("{} = EXCLUDED.{}", c, c))
                    .collect();
                format!("DO UPDATE SET {}", sets.join(", "))
            };
            let keys: Vec<String> = target.key_columns.iter().map(|k| quote_ident(k)).collect();
            let _ = writeln!(
                sql,
                "INSERT INTO {}\nSELECT * FROM {}\nON CONFLICT ({}) {};",
                table,
                inputs.from_item(None),
                keys.join(", "),
                action
            );
        }
    }

    sql
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_and_multiple_inputs() {
        let one = Inputs(vec!["a"]);
        assert_eq!(one.from_item(None), "a");
        assert_eq!(one.from_item(Some("s")), "a AS s");

        let two = Inputs(vec!["a", "b"]);
        assert_eq!(
            two.from_item(None),
            "(SELECT * FROM a UNION ALL SELECT * FROM b) AS input"
        );
    }

    #[test]
    fn placeholders() {
        let inputs = Inputs(vec!["orders", "returns"]);
        let sql = substitute_inputs(
            "SELECT o.id FROM {{input_1}} o JOIN {{input_2}} r ON o.id = r.id;\n",
            &inputs,
        );
        assert_eq!(sql, "SELECT o.id FROM orders o JOIN returns r ON o.id = r.id");

        let single = Inputs(vec!["orders"]);
        assert_eq!(
            substitute_inputs("SELECT count(*) FROM {{input}}", &single),
            "SELECT count(*) FROM orders"
        );
    }

    #[test]
    fn file_paths_are_quoted() {
        let source = SourceSettings::File {
            path: "/data/o'brien.csv".to_string(),
            format: pipewright_core::pipeline::FileFormat::Csv,
        };
        assert_eq!(render_source(&source), "SELECT * FROM '/data/o''brien.csv'");
    }

    #[test]
    fn comments_stay_on_one_line() {
        assert_eq!(comment("Sink\nDELETE FROM t;"), "-- Sink DELETE FROM t;");
        assert_eq!(comment("a\r\nb"), "-- a  b");
    }

    #[test]
    fn stream_topics_are_quoted() {
        let source = SourceSettings::Stream {
            connection: "events".to_string(),
            topic: "orders-topic".to_string(),
        };
        assert_eq!(render_source(&source), "SELECT * FROM \"orders-topic\"");
    }
}
