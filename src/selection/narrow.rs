//! Narrowing the ranked candidates to the endpoints the request needs.

use crate::error::{AppError, Result};
use crate::inference::{CompletionRequest, LanguageModel};
use crate::ingestion::HttpMethod;
use crate::retrieval::RagResult;
use crate::selection::parse::{parse_llm_json, JsonShape};
use crate::selection::prompts::find_endpoints_prompt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An endpoint the model chose as necessary for the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedEndpoint {
    pub path: String,
    pub method: HttpMethod,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
}

/// Ask the model for the minimal endpoint set among `candidates`.
///
/// An unparseable answer yields an empty selection rather than an error;
/// the construction step rejects an empty selection explicitly.
pub async fn find_relevant_endpoints(
    llm: &dyn LanguageModel,
    user_query: &str,
    candidates: &[RagResult],
    max_tokens: u32,
) -> Result<Vec<SelectedEndpoint>> {
    if candidates.is_empty() {
        return Err(AppError::InputMissing("RAG results not available".to_string()));
    }

    let prompt = find_endpoints_prompt(user_query, candidates);
    let response = llm
        .complete(CompletionRequest {
            prompt: &prompt,
            max_tokens,
        })
        .await?;

    Ok(parse_selection(&response))
}

/// Parse a narrowing response. Malformed items are skipped individually.
pub(crate) fn parse_selection(response: &str) -> Vec<SelectedEndpoint> {
    let outcome = parse_llm_json(response, JsonShape::Array);
    metrics::counter!("llm_parse_outcomes_total", "stage" => "narrow", "outcome" => outcome.label())
        .increment(1);

    let Some(Value::Array(items)) = outcome.into_value() else {
        tracing::warn!("Could not parse endpoint selection, continuing with none");
        return Vec::new();
    };

    let mut selected = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<SelectedEndpoint>(item) {
            Ok(endpoint) => selected.push(endpoint),
            Err(e) => {
                tracing::warn!(index = idx, error = %e, "Skipping malformed endpoint selection");
            }
        }
    }

    tracing::info!(selected = selected.len(), "Relevant endpoints found");
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selection_from_prose() {
        let response = r#"Here is the result: [{"path":"/pets","method":"get","summary":"List pets","description":""}] Thanks!"#;
        let selected = parse_selection(response);

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].path, "/pets");
        assert_eq!(selected[0].method, HttpMethod::Get);
    }

    #[test]
    fn test_parse_selection_skips_bad_items() {
        let response = r#"[{"path":"/a","method":"POST"},{"path":"/b","method":"TRACE"},{"method":"GET"}]"#;
        let selected = parse_selection(response);

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].path, "/a");
        assert_eq!(selected[0].summary, "");
    }

    #[test]
    fn test_unparseable_selection_is_empty() {
        assert!(parse_selection("No endpoints match.").is_empty());
    }
}
