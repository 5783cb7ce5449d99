//! Endpoint document extraction from OpenAPI specs.
//!
//! Walks `spec.paths` in document order and emits one [`EndpointDocument`]
//! per supported operation. The output order is what the cached embedding
//! vectors are aligned against, so it must be reproducible for a given spec.
//! Key order is preserved because `serde_json` is built with `preserve_order`.

use crate::ingestion::types::{EndpointDocument, HttpMethod};
use serde_json::Value;

/// Extract endpoint documents from a parsed OpenAPI spec.
///
/// Specs without a `paths` object produce an empty list. Path items that are
/// not objects and keys that are not supported methods are skipped.
pub fn extract_endpoint_documents(spec: &Value) -> Vec<EndpointDocument> {
    let Some(paths) = spec.get("paths").and_then(|p| p.as_object()) else {
        tracing::debug!("Spec has no 'paths' object");
        return Vec::new();
    };

    let mut documents = Vec::new();

    for (path, item) in paths {
        let Some(operations) = item.as_object() else {
            continue;
        };

        for (key, operation) in operations {
            let Ok(method) = key.parse::<HttpMethod>() else {
                continue;
            };

            documents.push(EndpointDocument::new(
                path.as_str(),
                method,
                string_field(operation, "summary"),
                string_field(operation, "description"),
            ));
        }
    }

    tracing::debug!(
        paths = paths.len(),
        endpoints = documents.len(),
        "Endpoint extraction complete"
    );

    documents
}

fn string_field<'a>(operation: &'a Value, key: &str) -> &'a str {
    operation.get(key).and_then(|v| v.as_str()).unwrap_or("")
}
