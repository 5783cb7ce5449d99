//! Final request construction from the selected endpoints.

use crate::error::{AppError, Result};
use crate::inference::{CompletionRequest, LanguageModel};
use crate::ingestion::HttpMethod;
use crate::schema::{limited_components, resolve_schema_closure};
use crate::selection::narrow::SelectedEndpoint;
use crate::selection::parse::{parse_llm_json, JsonShape};
use crate::selection::prompts::construct_request_prompt;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Error text of the sentinel returned when no request could be parsed.
pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse HTTP request";

/// The full operation object of one selected endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullEndpointSpec {
    pub path: String,
    pub method: HttpMethod,
    pub spec: Value,
}

/// The request the model built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructedRequest {
    pub method: String,
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_params: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

/// Either a request or the parse-failure sentinel `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HttpRequestOutcome {
    Request(ConstructedRequest),
    Failed { error: String },
}

impl HttpRequestOutcome {
    pub fn parse_failure() -> Self {
        Self::Failed {
            error: PARSE_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn request(&self) -> Option<&ConstructedRequest> {
        match self {
            Self::Request(request) => Some(request),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Look up the operation object for each selection.
///
/// Selections whose path or method does not exist in the spec are dropped.
pub fn full_endpoint_specs(api_spec: &Value, selected: &[SelectedEndpoint]) -> Vec<FullEndpointSpec> {
    let Some(paths) = api_spec.get("paths").and_then(|p| p.as_object()) else {
        return Vec::new();
    };

    selected
        .iter()
        .filter_map(|endpoint| {
            let operations = paths.get(&endpoint.path)?.as_object()?;
            let spec = operations
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(endpoint.method.as_str()))
                .map(|(_, operation)| operation.clone());

            if spec.is_none() {
                tracing::debug!(
                    path = %endpoint.path,
                    method = %endpoint.method,
                    "Selected endpoint not in spec, skipping"
                );
            }

            spec.map(|spec| FullEndpointSpec {
                path: endpoint.path.clone(),
                method: endpoint.method,
                spec,
            })
        })
        .collect()
}

/// Ask the model to build the final request for the selected endpoints.
pub async fn construct_http_request(
    llm: &dyn LanguageModel,
    user_query: &str,
    api_spec: &Value,
    selected: &[SelectedEndpoint],
    max_tokens: u32,
) -> Result<HttpRequestOutcome> {
    if selected.is_empty() {
        return Err(AppError::InputMissing(
            "Relevant endpoints not available".to_string(),
        ));
    }

    let specs = full_endpoint_specs(api_spec, selected);
    if specs.is_empty() {
        return Err(AppError::InputMissing(
            "None of the selected endpoints exist in the API spec".to_string(),
        ));
    }

    let components = api_spec.get("components").cloned().unwrap_or(Value::Null);
    let schema_names = resolve_schema_closure(specs.iter().map(|s| &s.spec), &components);
    let limited = limited_components(&components, &schema_names);

    tracing::debug!(
        endpoints = specs.len(),
        schemas = schema_names.len(),
        "Constructing HTTP request"
    );

    let prompt = construct_request_prompt(user_query, &specs, &limited);
    let response = llm
        .complete(CompletionRequest {
            prompt: &prompt,
            max_tokens,
        })
        .await?;

    Ok(parse_request(&response))
}

/// Parse a construction response, degrading to the sentinel on failure.
pub(crate) fn parse_request(response: &str) -> HttpRequestOutcome {
    let outcome = parse_llm_json(response, JsonShape::Object);
    metrics::counter!("llm_parse_outcomes_total", "stage" => "construct", "outcome" => outcome.label())
        .increment(1);

    let Some(value) = outcome.into_value() else {
        tracing::warn!("Could not parse HTTP request from model response");
        return HttpRequestOutcome::parse_failure();
    };

    match serde_json::from_value::<ConstructedRequest>(value) {
        Ok(mut request) => {
            request.method = request.method.to_ascii_uppercase();
            HttpRequestOutcome::Request(request)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Model response is not a usable HTTP request");
            HttpRequestOutcome::parse_failure()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec() -> Value {
        json!({
            "paths": {
                "/pets": {
                    "get": { "operationId": "listPets" },
                    "post": { "operationId": "createPet" }
                }
            }
        })
    }

    fn select(path: &str, method: HttpMethod) -> SelectedEndpoint {
        SelectedEndpoint {
            path: path.into(),
            method,
            summary: String::new(),
            description: String::new(),
        }
    }

    #[test]
    fn test_missing_endpoints_are_excluded() {
        let selected = vec![
            select("/pets", HttpMethod::Post),
            select("/pets", HttpMethod::Delete),
            select("/owners", HttpMethod::Get),
        ];

        let specs = full_endpoint_specs(&spec(), &selected);

        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].method, HttpMethod::Post);
        assert_eq!(specs[0].spec["operationId"], "createPet");
    }

    #[test]
    fn test_parse_request_with_nulls() {
        let outcome = parse_request(
            r#"{"method":"get","url":"https://api.example.com/pets","headers":null,"query_params":{"limit":10},"body":null,"description":"List pets"}"#,
        );

        let request = outcome.request().unwrap();
        assert_eq!(request.method, "GET");
        assert!(request.headers.is_empty());
        assert_eq!(request.query_params.as_ref().unwrap()["limit"], 10);
        assert!(request.body.is_none());
    }

    #[test]
    fn test_total_parse_failure_yields_sentinel() {
        let outcome = parse_request("Sorry, I can't build that request.");

        assert!(outcome.is_failure());
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({ "error": "Failed to parse HTTP request" })
        );
    }

    #[test]
    fn test_object_without_url_yields_sentinel() {
        assert!(parse_request(r#"{"method": "GET"}"#).is_failure());
    }
}
