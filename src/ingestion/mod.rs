//! Ingestion module for turning OpenAPI specs into searchable records.
//!
//! Each supported operation becomes an [`EndpointDocument`] whose `text`
//! field is the input to the embedding model.

pub mod extractor;
pub mod types;

pub use extractor::extract_endpoint_documents;
pub use types::{EndpointDocument, HttpMethod};
