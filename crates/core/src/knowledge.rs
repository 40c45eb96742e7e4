//! Knowledge store trait — the candidate's searchable document index.
//!
//! Callers never append. Ingestion replaces the whole corpus and retrieval is
//! a top-k similarity search.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::KnowledgeError;

/// A chunk of source text with the provenance shown to the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// The chunk text
    pub text: String,

    /// Name of the uploaded document the chunk came from
    pub filename: String,

    /// 1-based page number within the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Page count of the source document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

impl KnowledgeChunk {
    /// Metadata object stored next to the chunk text.
    pub fn metadata(&self) -> serde_json::Value {
        let mut meta = serde_json::json!({ "filename": self.filename });
        if let Some(page) = self.page {
            meta["page"] = page.into();
        }
        if let Some(total) = self.total_pages {
            meta["total_pages"] = total.into();
        }
        meta
    }

    /// Rebuild a chunk from stored text and metadata. Missing fields are tolerated.
    pub fn from_metadata(text: impl Into<String>, meta: &serde_json::Value) -> Self {
        let page_field = |key: &str| meta.get(key).and_then(|v| v.as_u64()).map(|n| n as u32);
        Self {
            text: text.into(),
            filename: meta
                .get("filename")
                .or_else(|| meta.get("source"))
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            page: page_field("page"),
            total_pages: page_field("total_pages"),
        }
    }
}

/// A search hit, ordered by descending `score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: KnowledgeChunk,
    pub score: f32,
}

/// Counts reported by [`KnowledgeStore::replace_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceOutcome {
    pub deleted: usize,
    pub created: usize,
}

#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Short backend name for logs (e.g., "supabase", "memory").
    fn name(&self) -> &str;

    /// Return at most `k` chunks most similar to `query`, best first.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, KnowledgeError>;

    /// Delete every stored chunk, then insert `chunks`.
    ///
    /// Failures report the phase that broke via [`KnowledgeError::Clear`] or
    /// [`KnowledgeError::Insert`].
    async fn replace_all(&self, chunks: Vec<KnowledgeChunk>) -> Result<ReplaceOutcome, KnowledgeError>;

    /// Number of chunks currently stored.
    async fn count(&self) -> Result<usize, KnowledgeError>;
}
