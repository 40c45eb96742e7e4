//! Embedding wrapper shared by every store backend.

use std::sync::Arc;

use tracing::debug;
use tribuna_core::error::KnowledgeError;
use tribuna_core::provider::EmbeddingRequest;
use tribuna_core::Provider;

/// Turns text into vectors with a fixed provider and model.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn Provider>,
    model: String,
    batch_size: usize,
}

impl Embedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, batch_size: usize) -> Self {
        Self {
            provider,
            model: model.into(),
            batch_size: batch_size.max(1),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Embed a single search query.
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>, KnowledgeError> {
        let mut vectors = self.embed_batch(vec![text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| KnowledgeError::Embedding("provider returned no vector".into()))
    }

    /// Embed documents in batches, preserving input order.
    pub async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, KnowledgeError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            debug!(model = %self.model, batch = batch.len(), "Embedding document batch");
            vectors.extend(self.embed_batch(batch.to_vec()).await?);
        }
        Ok(vectors)
    }

    async fn embed_batch(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>, KnowledgeError> {
        let expected = inputs.len();
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs,
            })
            .await
            .map_err(|e| KnowledgeError::Embedding(e.to_string()))?;

        if response.embeddings.len() != expected {
            return Err(KnowledgeError::Embedding(format!(
                "expected {expected} vectors, provider returned {}",
                response.embeddings.len()
            )));
        }
        Ok(response.embeddings)
    }
}
