//! Common test utilities for integration tests.

#![allow(dead_code)]

use pipewright_core::{Node, NodeTypeRegistry, Pipeline};

/// The built-in registry.
pub fn registry() -> NodeTypeRegistry {
    NodeTypeRegistry::builtin()
}

/// `A: source(table=orders)`.
pub fn orders_source() -> Node {
    Node::new("A", "source-pg")
        .with_label("Orders")
        .with_config("connection", "warehouse")
        .with_config("table", "orders")
}

/// `B: transform(filter: status='active')`.
pub fn active_filter() -> Node {
    Node::new("B", "transform-filter")
        .with_label("Active only")
        .with_config("condition", "status = 'active'")
}

/// `C: target(table=daily_orders)`.
pub fn daily_orders_target() -> Node {
    Node::new("C", "target-pg")
        .with_label("Daily orders")
        .with_config("connection", "warehouse")
        .with_config("table", "daily_orders")
}

/// Build a pipeline from nodes and edges, panicking on structural errors.
pub fn build(nodes: Vec<Node>, edges: &[(&str, &str)]) -> Pipeline {
    let mut pipeline = Pipeline::new("daily-orders", "Daily orders");
    for node in nodes {
        pipeline.add_node(node).unwrap();
    }
    for (from, to) in edges {
        pipeline.add_edge(from, to).unwrap();
    }
    pipeline
}

/// `A -> B -> C` with every required field set.
pub fn orders_pipeline() -> Pipeline {
    build(
        vec![orders_source(), active_filter(), daily_orders_target()],
        &[("A", "B"), ("B", "C")],
    )
}

/// A wider pipeline: two sources merged by SQL, aggregated, checked and
/// written with two different strategies.
pub fn branching_pipeline() -> Pipeline {
    build(
        vec![
            orders_source(),
            Node::new("R", "source-ch")
                .with_config("connection", "clickhouse")
                .with_config("schema", "archive")
                .with_config("table", "orders_2023"),
            Node::new("U", "transform-sql")
                .with_config("query", "SELECT * FROM {{input_1}} UNION SELECT * FROM {{input_2}}"),
            Node::new("G", "transform-aggregate")
                .with_config("group_by", vec!["region"])
                .with_config("aggregates", vec!["SUM(amount) AS total"]),
            Node::new("Q", "quality-check")
                .with_config("rule", "uniqueness")
                .with_config("column", "region")
                .with_config("mode", "block"),
            Node::new("T1", "target-ch")
                .with_config("connection", "clickhouse")
                .with_config("table", "region_totals")
                .with_config("load_strategy", "overwrite"),
            Node::new("T2", "target-pg")
                .with_config("connection", "warehouse")
                .with_config("table", "region_totals")
                .with_config("load_strategy", "upsert")
                .with_config("key_columns", vec!["region"])
                .with_config("columns", vec!["total"]),
        ],
        &[
            ("A", "U"),
            ("R", "U"),
            ("U", "G"),
            ("G", "Q"),
            ("Q", "T1"),
            ("Q", "T2"),
        ],
    )
}
