//! Component schema reference resolution.

pub mod resolver;

pub use resolver::{collect_schema_refs, limited_components, resolve_schema_closure};
