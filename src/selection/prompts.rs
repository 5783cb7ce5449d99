//! Prompt templates for the two selection steps.

use crate::retrieval::RagResult;
use crate::selection::construct::FullEndpointSpec;
use serde_json::Value;

fn pretty<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "[]".to_string())
}

/// Ask for the minimal endpoint set out of the pre-ranked candidates.
pub fn find_endpoints_prompt(user_query: &str, candidates: &[RagResult]) -> String {
    format!(
        r#"Given this user query: "{query}"

And this list of pre-filtered API endpoints from RAG (top most relevant):
{candidates}

Please identify the MINIMAL set of API endpoints needed to fulfill the user's request. Prioritize:
1. Single endpoints that can accomplish the entire task
2. Batch operations over multiple single-item calls
3. The most efficient and direct approach

Important:
- Consider the descriptions and summaries of the endpoints to determine relevance.
- ONLY consider the pre-filtered endpoints provided above.
- Do NOT reference your own knowledge of APIs.

Return as few endpoints as possible - ideally just one if it can handle the request completely.

Return your response as a JSON list of objects with keys: path, method, summary, description.
Copy these values exactly from the list above; do not rewrite or summarize them.
Only return the JSON, no other text."#,
        query = user_query,
        candidates = pretty(candidates),
    )
}

/// Ask for the final request object given full operation specs and the
/// schemas they reference.
pub fn construct_request_prompt(
    user_query: &str,
    endpoint_specs: &[FullEndpointSpec],
    components: &Value,
) -> String {
    format!(
        r#"Given this user query: "{query}"

And these API endpoint specifications:
{specs}

And these schema components for reference (limited):
{components}

Please construct the most efficient HTTP request to fulfill the user's query. Choose batch endpoints over multiple single-item calls when possible.

Return your response as a JSON object with these keys:
- method: HTTP method (GET, POST, etc.)
- url: Full URL path
- headers: Required headers as object
- query_params: Query parameters as object (if any)
- body: Request body as object (if any)
- description: Brief explanation of what this request does

Only return the JSON, no other text."#,
        query = user_query,
        specs = pretty(endpoint_specs),
        components = pretty(components),
    )
}
