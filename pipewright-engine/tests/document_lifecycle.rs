//! Integration tests for pipeline documents.
//!
//! Covers building a pipeline through edits, versioning, artifact caching
//! and the document store.

mod common;

use pipewright_core::{ConfigMap, ConfigValue, Node, PipelineError};
use pipewright_engine::codegen::ArtifactKind;
use pipewright_engine::document::{DocumentStore, Edit, PipelineDocument};
use std::sync::Arc;

use common::{
    active_filter, daily_orders_target, empty_document, generator, orders_pipeline,
    orders_source,
};

fn condition(value: &str) -> ConfigMap {
    let mut config = ConfigMap::new();
    config.insert("condition".into(), ConfigValue::string(value));
    config
}

#[test]
fn build_pipeline_through_edits() {
    let doc = empty_document();
    assert_eq!(doc.version(), 0);

    doc.add_node(orders_source()).unwrap();
    doc.add_node(Node::new("B", "transform-filter").with_label("Active only"))
        .unwrap();
    doc.add_node(daily_orders_target()).unwrap();
    doc.add_edge("A", "B").unwrap();
    doc.add_edge("B", "C").unwrap();
    assert_eq!(doc.version(), 5);

    // The filter was placed before it was configured.
    let report = doc.validate();
    let errors: Vec<_> = report.errors().collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("'condition'"));
    let warnings_before = report.warnings().count();

    doc.update_node_config("B", condition("status = 'active'"))
        .unwrap();
    let report = doc.validate();
    assert!(report.is_deployable());
    assert_eq!(report.warnings().count(), warnings_before);

    let artifact = doc.compile(ArtifactKind::Sql).unwrap();
    assert_eq!(artifact.version, 6);
    assert_eq!(
        artifact.text,
        generator()
            .generate(&orders_pipeline(), ArtifactKind::Sql)
            .unwrap()
    );
}

#[test]
fn every_mutation_increases_version_and_drops_artifacts() {
    let doc = PipelineDocument::from_pipeline(orders_pipeline(), generator());

    let edits = vec![
        Edit::SetNodeLabel {
            node_id: "B".into(),
            label: "Active".into(),
        },
        Edit::UpdateNodeConfig {
            node_id: "B".into(),
            config: condition("status <> 'void'"),
        },
        Edit::SetNodeConfig {
            node_id: "C".into(),
            config: daily_orders_target()
                .with_config("load_strategy", "overwrite")
                .config,
        },
        Edit::Rename("Orders".into()),
    ];

    let mut last = doc.version();
    for edit in edits {
        doc.compile(ArtifactKind::Json).unwrap();
        assert!(doc.cached(ArtifactKind::Json).is_some());

        let version = doc.apply(edit).unwrap();
        assert!(version > last);
        assert!(doc.cached(ArtifactKind::Json).is_none());
        last = version;
    }
}

#[test]
fn cycle_forming_edit_is_rejected() {
    let doc = PipelineDocument::from_pipeline(orders_pipeline(), generator());
    doc.compile(ArtifactKind::Sql).unwrap();
    let before = doc.snapshot();

    let err = doc.add_edge("C", "A").unwrap_err();
    assert!(matches!(err, PipelineError::CycleWouldForm { .. }));
    assert!(err.is_structural());

    let after = doc.snapshot();
    assert_eq!(after.version, before.version);
    assert_eq!(after.pipeline.edge_count(), 2);
    assert!(doc.cached(ArtifactKind::Sql).is_some());
}

#[test]
fn removing_a_node_drops_its_edges() {
    let doc = PipelineDocument::from_pipeline(orders_pipeline(), generator());
    doc.remove_node("B").unwrap();

    let snapshot = doc.snapshot();
    assert_eq!(snapshot.pipeline.edge_count(), 0);
    assert!(!doc.validate().is_deployable());
}

#[test]
fn optimistic_edit_after_concurrent_change() {
    let doc = PipelineDocument::from_pipeline(orders_pipeline(), generator());
    let seen = doc.version();

    doc.set_node_label("A", "Orders (raw)").unwrap();

    let err = doc
        .apply_at(seen, Edit::Rename("Orders".into()))
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::StaleVersion { expected, actual } if expected == seen && actual == seen + 1
    ));

    // Retry against the latest version.
    let latest = doc.version();
    assert_eq!(doc.apply_at(latest, Edit::Rename("Orders".into())).unwrap(), latest + 1);
}

#[test]
fn json_document_round_trip() {
    let json = orders_pipeline().to_canonical_json().unwrap();
    let doc = PipelineDocument::open(&json, generator()).unwrap();
    assert_eq!(doc.to_json().unwrap(), json);
    assert_eq!(doc.compile(ArtifactKind::Json).unwrap().text, json);
}

#[test]
fn open_keeps_cycles_for_validation() {
    let json = r#"{
        "id": "loop",
        "name": "Loop",
        "nodes": [
            {"id": "A", "type": "transform-filter", "config": {"condition": "x > 0"}},
            {"id": "B", "type": "transform-filter", "config": {"condition": "x > 1"}}
        ],
        "edges": [{"from": "A", "to": "B"}, {"from": "B", "to": "A"}]
    }"#;
    let doc = PipelineDocument::open(json, generator()).unwrap();

    let report = doc.validate();
    assert!(report.errors().any(|d| d.message.contains("part of a cycle")));
    let err = doc.compile(ArtifactKind::Sql).unwrap_err();
    assert_eq!(err.code(), "E301");
}

#[test]
fn store_serves_independent_documents() {
    let store = DocumentStore::new(generator());
    let orders = store.create("daily-orders", "Daily orders").unwrap();
    let other = store
        .open(r#"{"id": "returns", "name": "Returns"}"#)
        .unwrap();

    orders.add_node(orders_source()).unwrap();
    orders.add_node(active_filter()).unwrap();
    assert_eq!(orders.version(), 2);
    assert_eq!(other.version(), 0);

    assert!(Arc::ptr_eq(&store.get("daily-orders").unwrap(), &orders));
    assert_eq!(store.list().len(), 2);

    let err = store.create("returns", "Returns").unwrap_err();
    assert_eq!(err.code(), "E107");
}

#[test]
fn readers_see_consistent_snapshots_under_writes() {
    let doc = PipelineDocument::from_pipeline(orders_pipeline(), generator());

    std::thread::scope(|s| {
        s.spawn(|| {
            for i in 0..50 {
                doc.update_node_config("B", condition(&format!("amount > {}", i)))
                    .unwrap();
            }
        });
        for _ in 0..3 {
            s.spawn(|| {
                for _ in 0..50 {
                    let snapshot = doc.snapshot();
                    assert_eq!(snapshot.pipeline.node_count(), 3);
                    match doc.compile(ArtifactKind::Sql) {
                        Ok(artifact) => assert!(artifact.text.contains("INSERT INTO daily_orders")),
                        Err(e) => assert!(matches!(e, PipelineError::StaleVersion { .. })),
                    }
                }
            });
        }
    });

    assert_eq!(doc.version(), 50);
    let artifact = doc.compile(ArtifactKind::Sql).unwrap();
    assert!(artifact.text.contains("WHERE amount > 49"));
}
