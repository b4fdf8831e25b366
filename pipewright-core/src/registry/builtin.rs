//! Built-in node type catalog.

use super::spec::{Category, FieldSpec, NodeTypeSpec, ValueType};

/// Load strategies accepted by targets.
pub const LOAD_STRATEGIES: [&str; 4] = ["append", "overwrite", "merge", "upsert"];

/// Rule kinds accepted by quality checks.
pub const QUALITY_RULES: [&str; 6] = [
    "completeness",
    "uniqueness",
    "range",
    "referential",
    "format",
    "custom",
];

/// Failure modes of a quality check.
pub const QUALITY_MODES: [&str; 2] = ["warn", "block"];

/// File formats accepted by file sources.
pub const FILE_FORMATS: [&str; 3] = ["csv", "parquet", "json"];

/// Build the default catalog.
pub(super) fn catalog() -> Vec<NodeTypeSpec> {
    vec![
        database_source("source-pg", "PostgreSQL", "Read a table from PostgreSQL"),
        database_source("source-ch", "ClickHouse", "Read a table from ClickHouse"),
        NodeTypeSpec::new("source-file", Category::Source)
            .with_display_name("File Source")
            .with_description("Read a CSV, Parquet or JSON file")
            .with_field(FieldSpec::required("path", ValueType::String))
            .with_field(
                FieldSpec::required("format", ValueType::Enum)
                    .with_options(FILE_FORMATS)
                    .with_default("csv"),
            ),
        NodeTypeSpec::new("source-kafka", Category::Source)
            .with_display_name("Kafka")
            .with_description("Read records from a Kafka topic")
            .with_field(FieldSpec::required("connection", ValueType::String))
            .with_field(FieldSpec::required("topic", ValueType::String)),
        NodeTypeSpec::new("transform-filter", Category::Transform)
            .with_display_name("Filter")
            .with_description("Keep rows matching a predicate")
            .with_field(FieldSpec::required("condition", ValueType::String)),
        NodeTypeSpec::new("transform-aggregate", Category::Transform)
            .with_display_name("Aggregate")
            .with_description("Group rows and compute aggregate expressions")
            .with_field(FieldSpec::required("group_by", ValueType::List))
            .with_field(FieldSpec::required("aggregates", ValueType::List))
            .with_field(FieldSpec::optional("condition", ValueType::String)),
        NodeTypeSpec::new("transform-sql", Category::Transform)
            .with_display_name("SQL Transform")
            .with_description("Run a raw SQL query over the inputs")
            .with_field(FieldSpec::required("query", ValueType::String)),
        NodeTypeSpec::new("quality-check", Category::QualityCheck)
            .with_display_name("Quality Check")
            .with_description("Assert a data quality rule without changing rows")
            .with_field(FieldSpec::required("rule", ValueType::Enum).with_options(QUALITY_RULES))
            .with_field(FieldSpec::required("column", ValueType::String))
            .with_field(FieldSpec::optional("expression", ValueType::String))
            .with_field(FieldSpec::optional("threshold", ValueType::Number).with_default(100_i64))
            .with_field(
                FieldSpec::optional("mode", ValueType::Enum)
                    .with_options(QUALITY_MODES)
                    .with_default("warn"),
            ),
        database_target("target-pg", "PostgreSQL", "Write to a PostgreSQL table"),
        database_target("target-ch", "ClickHouse", "Write to a ClickHouse table"),
        database_target("target-hdfs", "HDFS", "Write to a data lake table on HDFS"),
    ]
}

fn database_source(id: &str, name: &str, description: &str) -> NodeTypeSpec {
    NodeTypeSpec::new(id, Category::Source)
        .with_display_name(name)
        .with_description(description)
        .with_field(FieldSpec::required("connection", ValueType::String))
        .with_field(FieldSpec::required("table", ValueType::String))
        .with_field(FieldSpec::optional("schema", ValueType::String))
}

fn database_target(id: &str, name: &str, description: &str) -> NodeTypeSpec {
    NodeTypeSpec::new(id, Category::Target)
        .with_display_name(name)
        .with_description(description)
        .with_field(FieldSpec::required("connection", ValueType::String))
        .with_field(FieldSpec::required("table", ValueType::String))
        .with_field(FieldSpec::optional("schema", ValueType::String))
        .with_field(
            FieldSpec::optional("load_strategy", ValueType::Enum)
                .with_options(LOAD_STRATEGIES)
                .with_default("append"),
        )
        .with_field(FieldSpec::optional("key_columns", ValueType::List))
        .with_field(FieldSpec::optional("columns", ValueType::List))
}
