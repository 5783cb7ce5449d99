//! Transitive `$ref` closure over `components.schemas`.
//!
//! The construction prompt only carries the schemas the selected operations
//! can reach, which keeps prompt size bounded without ever dropping a schema
//! an operation depends on.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Call `visit` for every string-valued `$ref` anywhere inside `value`.
fn walk_refs<F: FnMut(&str)>(value: &Value, visit: &mut F) {
    match value {
        Value::Object(obj) => {
            for (key, child) in obj {
                match (key.as_str(), child) {
                    ("$ref", Value::String(target)) => visit(target),
                    _ => walk_refs(child, visit),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_refs(item, visit);
            }
        }
        _ => {}
    }
}

/// Schema name from a local component reference, JSON-pointer unescaped.
///
/// Pointers into a schema (`#/components/schemas/A/properties/b`) name `A`.
fn schema_name(target: &str) -> Option<String> {
    target
        .strip_prefix(SCHEMA_REF_PREFIX)
        .and_then(|rest| rest.split('/').next())
        .filter(|name| !name.is_empty())
        .map(|name| name.replace("~1", "/").replace("~0", "~"))
}

/// Add the names of all `#/components/schemas/*` references in `value` to `refs`.
///
/// Other reference kinds (`#/components/parameters/...`, remote refs) are ignored.
pub fn collect_schema_refs(value: &Value, refs: &mut BTreeSet<String>) {
    walk_refs(value, &mut |target: &str| {
        if let Some(name) = schema_name(target) {
            refs.insert(name);
        }
    });
}

/// All schema names reachable from `operations`, following references through
/// the schemas in `components.schemas`.
///
/// Each name is expanded at most once, so reference cycles terminate. Names
/// that do not exist in `components.schemas` are still reported; they simply
/// contribute no further references.
pub fn resolve_schema_closure<'a, I>(operations: I, components: &Value) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a Value>,
{
    let schemas = components.get("schemas").and_then(|s| s.as_object());

    let mut seen = BTreeSet::new();
    for operation in operations {
        collect_schema_refs(operation, &mut seen);
    }

    let mut frontier: Vec<String> = seen.iter().cloned().collect();

    while let Some(name) = frontier.pop() {
        let Some(schema) = schemas.and_then(|s| s.get(&name)) else {
            continue;
        };

        let mut found = BTreeSet::new();
        collect_schema_refs(schema, &mut found);

        for reference in found {
            if seen.insert(reference.clone()) {
                frontier.push(reference);
            }
        }
    }

    seen
}

/// A `components` object containing only the named schemas.
///
/// Returns `{}` when nothing is referenced, `{"schemas": {...}}` otherwise.
/// Schemas keep their order from the spec.
pub fn limited_components(components: &Value, names: &BTreeSet<String>) -> Value {
    let mut limited = Map::new();

    if let Some(schemas) = components.get("schemas").and_then(|s| s.as_object()) {
        let kept: Map<String, Value> = schemas
            .iter()
            .filter(|(name, _)| names.contains(name.as_str()))
            .map(|(name, schema)| (name.clone(), schema.clone()))
            .collect();

        if !kept.is_empty() {
            limited.insert("schemas".to_string(), Value::Object(kept));
        }
    }

    Value::Object(limited)
}
