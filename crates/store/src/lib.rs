//! Knowledge store implementations for Tribuna.
//!
//! Every backend implements [`tribuna_core::KnowledgeStore`] and embeds text
//! through an [`Embedder`], so ingestion and retrieval always agree on the
//! embedding model.

pub mod embedder;
pub mod in_memory;
pub mod supabase;
pub mod vector;

use std::sync::Arc;

use tribuna_config::{AppConfig, StoreBackend};
use tribuna_core::{KnowledgeStore, Provider};

pub use embedder::Embedder;
pub use in_memory::InMemoryStore;
pub use supabase::SupabaseStore;
pub use vector::{cosine_similarity, rank_by_similarity};

/// Build the configured store backend on top of `embedding_provider`.
pub fn store_from_config(
    config: &AppConfig,
    embedding_provider: Arc<dyn Provider>,
) -> Arc<dyn KnowledgeStore> {
    let embedder = Embedder::new(
        embedding_provider,
        config.embeddings.model.clone(),
        config.embeddings.batch_size,
    );

    match config.store.backend {
        StoreBackend::Supabase => Arc::new(SupabaseStore::new(
            config.store.url.clone().unwrap_or_default(),
            config.store.service_key.clone().unwrap_or_default(),
            config.store.table.clone(),
            config.store.query_name.clone(),
            embedder,
        )),
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory knowledge store; ingested documents are lost on restart");
            Arc::new(InMemoryStore::new(embedder))
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Deterministic embedding provider for store tests.

    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tribuna_core::error::ProviderError;
    use tribuna_core::provider::*;

    /// Embeds text as keyword counts over a fixed vocabulary.
    pub struct KeywordEmbeddings {
        vocabulary: Vec<&'static str>,
        pub calls: AtomicUsize,
        pub fail: bool,
    }

    impl KeywordEmbeddings {
        pub fn new(vocabulary: &[&'static str]) -> Self {
            Self {
                vocabulary: vocabulary.to_vec(),
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(&["x"])
            }
        }

        pub fn vector(&self, text: &str) -> Vec<f32> {
            let lower = text.to_lowercase();
            self.vocabulary
                .iter()
                .map(|word| lower.matches(word).count() as f32)
                .collect()
        }
    }

    #[async_trait]
    impl Provider for KeywordEmbeddings {
        fn name(&self) -> &str {
            "keyword"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::NotConfigured("embedding-only".into()))
        }

        async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::Network("embedding service unreachable".into()));
            }
            Ok(EmbeddingResponse {
                embeddings: request.inputs.iter().map(|t| self.vector(t)).collect(),
                model: request.model,
                usage: None,
            })
        }
    }
}
