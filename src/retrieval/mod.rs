//! Similarity ranking of endpoint documents against a query.
//!
//! Scores are plain dot products of the query vector with each document
//! vector. That is cosine similarity only when the embedding model returns
//! unit-length vectors; nothing here renormalizes.

use crate::error::{AppError, Result};
use crate::inference::{Embedder, InputType};
use crate::ingestion::{EndpointDocument, HttpMethod};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// A ranked endpoint as handed to the narrowing step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagResult {
    pub path: String,
    pub method: HttpMethod,
    pub summary: String,
    pub description: String,
    pub similarity: f32,
}

/// Score-only view of one endpoint, kept for every endpoint in the spec.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointScore {
    /// `"METHOD path"`
    pub endpoint: String,
    pub score: f32,
}

/// Every endpoint of a spec, best match first.
#[derive(Debug, Clone, Default)]
pub struct RankedEndpoints {
    ranked: Vec<(EndpointDocument, f32)>,
}

impl RankedEndpoints {
    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(EndpointDocument, f32)> {
        self.ranked.iter()
    }

    /// The `k` highest-scoring endpoints.
    pub fn top_k(&self, k: usize) -> Vec<RagResult> {
        self.ranked
            .iter()
            .take(k)
            .map(|(doc, similarity)| RagResult {
                path: doc.path.clone(),
                method: doc.method,
                summary: doc.summary.clone(),
                description: doc.description.clone(),
                similarity: *similarity,
            })
            .collect()
    }

    /// Scores for all endpoints, untruncated.
    pub fn all_scores(&self) -> Vec<EndpointScore> {
        self.ranked
            .iter()
            .map(|(doc, score)| EndpointScore {
                endpoint: doc.label(),
                score: *score,
            })
            .collect()
    }
}

/// Dot product of `query` with each document vector.
pub fn similarities(query: &[f32], doc_embeddings: &[Vec<f32>]) -> Result<Vec<f32>> {
    let query = ArrayView1::from(query);

    doc_embeddings
        .iter()
        .enumerate()
        .map(|(idx, doc)| {
            if doc.len() != query.len() {
                return Err(AppError::ModelError(format!(
                    "embedding dimension mismatch at document {}: query has {}, document has {}",
                    idx,
                    query.len(),
                    doc.len()
                )));
            }
            let score = query.dot(&ArrayView1::from(doc.as_slice()));
            if !score.is_finite() {
                return Err(AppError::ModelError(format!(
                    "non-finite similarity {} at document {}",
                    score, idx
                )));
            }
            Ok(score)
        })
        .collect()
}

/// Rank documents by similarity to an already computed query embedding.
///
/// The sort is stable, so equal scores keep their extraction order.
pub fn rank(
    query_embedding: &[f32],
    documents: &[EndpointDocument],
    doc_embeddings: &[Vec<f32>],
) -> Result<RankedEndpoints> {
    if documents.len() != doc_embeddings.len() {
        return Err(AppError::ModelError(format!(
            "{} embeddings for {} endpoint documents",
            doc_embeddings.len(),
            documents.len()
        )));
    }

    let scores = similarities(query_embedding, doc_embeddings)?;

    let mut ranked: Vec<(EndpointDocument, f32)> =
        documents.iter().cloned().zip(scores).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    Ok(RankedEndpoints { ranked })
}

/// Embed `query` and rank `documents` against it.
///
/// The query embedding is never cached. An empty document list ranks to an
/// empty result without calling the embedder.
pub async fn rank_query(
    embedder: &dyn Embedder,
    model: &str,
    query: &str,
    documents: &[EndpointDocument],
    doc_embeddings: &[Vec<f32>],
) -> Result<RankedEndpoints> {
    if documents.is_empty() {
        return Ok(RankedEndpoints::default());
    }

    let mut vectors = embedder
        .embed(&[query.to_string()], model, InputType::Query)
        .await?;

    let query_embedding = vectors
        .pop()
        .filter(|_| vectors.is_empty())
        .ok_or_else(|| AppError::ModelError("expected exactly one query embedding".to_string()))?;

    rank(&query_embedding, documents, doc_embeddings)
}
