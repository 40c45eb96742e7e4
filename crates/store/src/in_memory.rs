//! In-memory store — for local development and tests.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use tribuna_core::error::KnowledgeError;
use tribuna_core::knowledge::{KnowledgeChunk, KnowledgeStore, ReplaceOutcome, ScoredChunk};

use crate::embedder::Embedder;
use crate::vector::rank_by_similarity;

struct StoredChunk {
    chunk: KnowledgeChunk,
    embedding: Vec<f32>,
}

/// A knowledge store that keeps chunks and their embeddings in a Vec.
pub struct InMemoryStore {
    embedder: Embedder,
    entries: Arc<RwLock<Vec<StoredChunk>>>,
}

impl InMemoryStore {
    pub fn new(embedder: Embedder) -> Self {
        Self {
            embedder,
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, KnowledgeError> {
        let query_embedding = self.embedder.embed_query(query).await?;
        let entries = self.entries.read().await;

        let ranked = rank_by_similarity(
            entries.iter().map(|e| (e, e.embedding.as_slice())),
            &query_embedding,
            k,
        );

        Ok(ranked
            .into_iter()
            .map(|(entry, score)| ScoredChunk {
                chunk: entry.chunk.clone(),
                score,
            })
            .collect())
    }

    async fn replace_all(&self, chunks: Vec<KnowledgeChunk>) -> Result<ReplaceOutcome, KnowledgeError> {
        // Embed before touching the index so a provider failure keeps the old corpus.
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_documents(&texts).await?;

        let mut entries = self.entries.write().await;
        let deleted = entries.len();
        entries.clear();
        entries.extend(
            chunks
                .into_iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| StoredChunk { chunk, embedding }),
        );
        let created = entries.len();

        info!(deleted, created, "Replaced in-memory knowledge base");
        Ok(ReplaceOutcome { deleted, created })
    }

    async fn count(&self) -> Result<usize, KnowledgeError> {
        Ok(self.entries.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::KeywordEmbeddings;

    fn chunk(text: &str, page: u32) -> KnowledgeChunk {
        KnowledgeChunk {
            text: text.into(),
            filename: "plan.pdf".into(),
            page: Some(page),
            total_pages: Some(3),
        }
    }

    fn store() -> InMemoryStore {
        let provider = Arc::new(KeywordEmbeddings::new(&["salud", "empleo", "seguridad"]));
        InMemoryStore::new(Embedder::new(provider, "keyword", 16))
    }

    #[tokio::test]
    async fn search_returns_best_matches_first() {
        let store = store();
        store
            .replace_all(vec![
                chunk("Empleo juvenil y empleo rural", 1),
                chunk("Salud pública: hospitales y salud mental", 2),
                chunk("Seguridad ciudadana", 3),
            ])
            .await
            .unwrap();

        let hits = store.search("propuestas de salud", 4).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.page, Some(2));
        assert!(hits[0].score > 0.9);
    }

    #[tokio::test]
    async fn search_respects_k() {
        let store = store();
        store
            .replace_all(vec![
                chunk("salud", 1),
                chunk("salud y empleo", 2),
                chunk("salud, empleo y seguridad", 3),
            ])
            .await
            .unwrap();

        let hits = store.search("salud", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.page, Some(1));
    }

    #[tokio::test]
    async fn replace_all_discards_previous_corpus() {
        let store = store();
        let first = store
            .replace_all(vec![chunk("salud", 1), chunk("empleo", 2), chunk("seguridad", 3)])
            .await
            .unwrap();
        assert_eq!(first, ReplaceOutcome { deleted: 0, created: 3 });

        let second = store.replace_all(vec![chunk("empleo", 1)]).await.unwrap();
        assert_eq!(second, ReplaceOutcome { deleted: 3, created: 1 });
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.search("salud", 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_store_yields_no_hits() {
        let store = store();
        assert!(store.search("salud", 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn embedding_failure_keeps_existing_chunks() {
        let store = store();
        store.replace_all(vec![chunk("salud", 1)]).await.unwrap();

        let failing = InMemoryStore {
            embedder: Embedder::new(Arc::new(KeywordEmbeddings::failing()), "m", 4),
            entries: store.entries.clone(),
        };
        let err = failing.replace_all(vec![chunk("empleo", 1)]).await.unwrap_err();
        assert!(matches!(err, KnowledgeError::Embedding(_)));
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
