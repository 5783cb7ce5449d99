//! LLM-mediated endpoint selection and request construction.
//!
//! Both steps share the same response contract: parse the completion as
//! JSON, salvage the outermost bracketed span if that fails, and degrade to a
//! named failure value instead of raising.

pub mod construct;
pub mod narrow;
pub mod parse;
pub mod prompts;

pub use construct::{
    construct_http_request, full_endpoint_specs, ConstructedRequest, FullEndpointSpec,
    HttpRequestOutcome, PARSE_FAILURE_MESSAGE,
};
pub use narrow::{find_relevant_endpoints, SelectedEndpoint};
pub use parse::{parse_llm_json, JsonShape, ParseOutcome};
