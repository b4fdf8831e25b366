//! Identifiers for generated SQL.
//!
//! Views live in their own namespace: every relation name starts with
//! [`VIEW_PREFIX`], and names that would still clash with a table or topic
//! the pipeline reads or writes get a numeric suffix. A node whose ID equals
//! a table name therefore never shadows that table.

use pipewright_core::{ConfigValue, NodeId, Pipeline};
use std::collections::{BTreeMap, HashSet};

/// Prefix of every generated view name.
pub const VIEW_PREFIX: &str = "pw_";

/// Map every node to a unique view name.
///
/// Characters outside `[A-Za-z0-9_]` become `_` and collisions get a numeric
/// suffix. Names are assigned in ascending node ID order, so the mapping
/// depends only on the pipeline. Comparison is case-insensitive, like
/// unquoted SQL identifiers.
pub fn relation_names(pipeline: &Pipeline) -> BTreeMap<NodeId, String> {
    let mut taken: HashSet<String> = external_relations(pipeline)
        .map(|name| name.to_ascii_lowercase())
        .collect();
    let mut names = BTreeMap::new();

    for node in pipeline.nodes() {
        let base = format!("{}{}", VIEW_PREFIX, sanitize(node.id.as_str()));
        let mut name = base.clone();
        let mut suffix = 2;
        while !taken.insert(name.to_ascii_lowercase()) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        names.insert(node.id.clone(), name);
    }

    names
}

/// Unqualified table and topic names referenced by node configuration.
fn external_relations(pipeline: &Pipeline) -> impl Iterator<Item = &str> + use<'_> {
    pipeline.nodes().flat_map(|node| {
        ["table", "topic"]
            .into_iter()
            .filter_map(move |field| node.config.get(field).and_then(ConfigValue::as_str))
            .filter_map(|name| name.rsplit('.').next())
    })
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
pub fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Quote an identifier unless it is a plain word.
///
/// Plain words match `[A-Za-z_][A-Za-z0-9_]*`. Anything else is wrapped in
/// double quotes with embedded quotes doubled.
pub fn quote_ident(name: &str) -> String {
    let plain = name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

/// Quote a table reference, splitting dotted names into qualifiers.
pub fn table_ref(schema: Option<&str>, table: &str) -> String {
    schema
        .into_iter()
        .flat_map(|s| s.split('.'))
        .chain(table.split('.'))
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}
