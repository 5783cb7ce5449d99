//! Fake collaborators shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use http_translator::inference::CompletionRequest;
use http_translator::{
    AppError, Embedder, InputType, LanguageModel, Result, SpecFetcher, Translator,
    TranslatorSettings,
};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const SPEC_URL: &str = "https://petstore.example/openapi.json";
pub const EMBEDDING_MODEL: &str = "fake-embed";

/// Keywords that make up the fake embedding space, one dimension each.
const KEYWORDS: [&str; 6] = ["pet", "order", "user", "list", "create", "delete"];

pub fn petstore_spec() -> Value {
    json!({
        "openapi": "3.0.0",
        "paths": {
            "/pets": {
                "get": { "summary": "List pets", "description": "Returns all pets" },
                "post": {
                    "summary": "Create a pet",
                    "requestBody": {
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/Pet" }
                            }
                        }
                    }
                }
            },
            "/pets/{petId}": {
                "get": { "summary": "Get a pet by id" },
                "delete": { "summary": "Delete a pet" }
            },
            "/orders": {
                "post": {
                    "summary": "Create an order",
                    "requestBody": {
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/Order" }
                            }
                        }
                    }
                }
            },
            "/users": {
                "get": { "summary": "List users" }
            }
        },
        "components": {
            "schemas": {
                "Pet": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "category": { "$ref": "#/components/schemas/Category" }
                    }
                },
                "Category": { "type": "object", "properties": { "label": { "type": "string" } } },
                "Order": {
                    "type": "object",
                    "properties": { "pet": { "$ref": "#/components/schemas/Pet" } }
                },
                "Unused": { "type": "string" }
            }
        }
    })
}

pub const NARROW_CREATE_PET: &str = r#"Here you go: [{"path": "/pets", "method": "POST", "summary": "Create a pet", "description": ""}] Let me know!"#;

pub const CONSTRUCT_CREATE_PET: &str = r#"{"method": "POST", "url": "https://petstore.example/pets", "headers": {"Content-Type": "application/json"}, "body": {"name": "Rex"}, "description": "Create a pet named Rex"}"#;

/// Serves specs from memory and counts downloads.
#[derive(Default)]
pub struct FakeFetcher {
    specs: HashMap<String, Value>,
    pub calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn with_spec(url: &str, spec: Value) -> Self {
        let mut specs = HashMap::new();
        specs.insert(url.to_string(), spec);
        Self {
            specs,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpecFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.specs
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::TransportError(format!("404 for {}", url)))
    }
}

/// Bag-of-keywords embedder producing unit-length vectors.
#[derive(Default)]
pub struct FakeEmbedder {
    pub calls: Mutex<Vec<(InputType, usize)>>,
}

impl FakeEmbedder {
    pub fn calls_of(&self, input_type: InputType) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(kind, _)| *kind == input_type)
            .count()
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let raw: Vec<f32> = KEYWORDS
            .iter()
            .map(|k| if lower.contains(k) { 1.0 } else { 0.0 })
            .collect();
        let norm = raw.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm == 0.0 {
            raw
        } else {
            raw.into_iter().map(|x| x / norm).collect()
        }
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(
        &self,
        texts: &[String],
        _model: &str,
        input_type: InputType,
    ) -> Result<Vec<Vec<f32>>> {
        self.calls.lock().unwrap().push((input_type, texts.len()));
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }
}

/// Answers prompts from a script, recording every prompt it sees.
#[derive(Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompt(&self, idx: usize) -> String {
        self.prompts.lock().unwrap()[idx].clone()
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String> {
        self.prompts.lock().unwrap().push(request.prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::TransportError("script exhausted".to_string()))
    }
}

pub fn settings(top_k: usize) -> TranslatorSettings {
    TranslatorSettings {
        embedding_model: EMBEDDING_MODEL.to_string(),
        top_k_endpoints: top_k,
        find_endpoints_max_tokens: 1000,
        construct_request_max_tokens: 2000,
    }
}

pub struct Harness {
    pub fetcher: Arc<FakeFetcher>,
    pub embedder: Arc<FakeEmbedder>,
    pub llm: Arc<ScriptedModel>,
    pub translator: Translator,
}

pub fn harness(responses: &[&str], top_k: usize) -> Harness {
    harness_with_spec(petstore_spec(), responses, top_k)
}

pub fn harness_with_spec(spec: Value, responses: &[&str], top_k: usize) -> Harness {
    let fetcher = Arc::new(FakeFetcher::with_spec(SPEC_URL, spec));
    let embedder = Arc::new(FakeEmbedder::default());
    let llm = Arc::new(ScriptedModel::new(responses));

    let translator = Translator::new(
        fetcher.clone(),
        embedder.clone(),
        llm.clone(),
        settings(top_k),
    );

    Harness {
        fetcher,
        embedder,
        llm,
        translator,
    }
}
