//! Supabase store — Postgres + pgvector reached through the PostgREST API.
//!
//! Expects a table shaped `(id uuid, content text, metadata jsonb,
//! embedding vector)` and a SQL function `query_name(query_embedding vector)`
//! returning rows with a `similarity` column, ordered best first.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tribuna_core::error::KnowledgeError;
use tribuna_core::knowledge::{KnowledgeChunk, KnowledgeStore, ReplaceOutcome, ScoredChunk};

use crate::embedder::Embedder;

/// Rows per insert request.
const INSERT_BATCH: usize = 500;

pub struct SupabaseStore {
    rest_url: String,
    service_key: String,
    table: String,
    query_name: String,
    embedder: Embedder,
    client: reqwest::Client,
}

impl SupabaseStore {
    pub fn new(
        project_url: impl Into<String>,
        service_key: impl Into<String>,
        table: impl Into<String>,
        query_name: impl Into<String>,
        embedder: Embedder,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            rest_url: format!("{}/rest/v1", project_url.into().trim_end_matches('/')),
            service_key: service_key.into(),
            table: table.into(),
            query_name: query_name.into(),
            embedder,
            client,
        }
    }

    fn table_url(&self) -> String {
        format!("{}/{}", self.rest_url, self.table)
    }

    fn rpc_url(&self) -> String {
        format!("{}/rpc/{}", self.rest_url, self.query_name)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }

    async fn clear(&self) -> Result<usize, KnowledgeError> {
        let response = self
            .request(reqwest::Method::DELETE, &self.table_url())
            .query(&[("id", "not.is.null"), ("select", "id")])
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(|e| KnowledgeError::Clear(e.to_string()))?;

        let response = check(response).await.map_err(KnowledgeError::Clear)?;
        let deleted: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| KnowledgeError::Clear(format!("unexpected delete response: {e}")))?;
        Ok(deleted.len())
    }

    async fn insert(&self, rows: &[DocumentRow]) -> Result<(), KnowledgeError> {
        for batch in rows.chunks(INSERT_BATCH) {
            let response = self
                .request(reqwest::Method::POST, &self.table_url())
                .header("Prefer", "return=minimal")
                .json(batch)
                .send()
                .await
                .map_err(|e| KnowledgeError::Insert(e.to_string()))?;
            check(response).await.map_err(KnowledgeError::Insert)?;
            debug!(rows = batch.len(), table = %self.table, "Inserted chunk batch");
        }
        Ok(())
    }
}

/// Pass through 2xx responses; turn anything else into a message.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), body = %body, "PostgREST returned error");
    Err(format!("status {}: {}", status.as_u16(), body))
}

/// Parse the total out of a PostgREST `Content-Range` header (`0-0/42`, `*/0`).
fn parse_content_range(value: &str) -> Option<usize> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

#[derive(Debug, Serialize)]
struct DocumentRow {
    id: String,
    content: String,
    metadata: serde_json::Value,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct MatchRow {
    content: String,
    #[serde(default)]
    metadata: serde_json::Value,
    #[serde(default)]
    similarity: f32,
}

impl From<MatchRow> for ScoredChunk {
    fn from(row: MatchRow) -> Self {
        ScoredChunk {
            chunk: KnowledgeChunk::from_metadata(row.content, &row.metadata),
            score: row.similarity,
        }
    }
}

fn build_rows(chunks: Vec<KnowledgeChunk>, embeddings: Vec<Vec<f32>>) -> Vec<DocumentRow> {
    chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| DocumentRow {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: chunk.metadata(),
            content: chunk.text,
            embedding,
        })
        .collect()
}

#[async_trait]
impl KnowledgeStore for SupabaseStore {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, KnowledgeError> {
        let query_embedding = self.embedder.embed_query(query).await?;

        let response = self
            .request(reqwest::Method::POST, &self.rpc_url())
            .query(&[("limit", k.to_string())])
            .json(&serde_json::json!({ "query_embedding": query_embedding }))
            .send()
            .await
            .map_err(|e| KnowledgeError::Query(e.to_string()))?;

        let response = check(response).await.map_err(KnowledgeError::Query)?;
        let rows: Vec<MatchRow> = response
            .json()
            .await
            .map_err(|e| KnowledgeError::Query(format!("unexpected match response: {e}")))?;

        let mut hits: Vec<ScoredChunk> = rows.into_iter().map(ScoredChunk::from).collect();
        hits.truncate(k);
        Ok(hits)
    }

    async fn replace_all(&self, chunks: Vec<KnowledgeChunk>) -> Result<ReplaceOutcome, KnowledgeError> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_documents(&texts).await?;
        let rows = build_rows(chunks, embeddings);

        let deleted = self.clear().await?;
        info!(deleted, table = %self.table, "Cleared knowledge base");

        self.insert(&rows).await?;
        info!(created = rows.len(), table = %self.table, "Indexed chunks");

        Ok(ReplaceOutcome {
            deleted,
            created: rows.len(),
        })
    }

    async fn count(&self) -> Result<usize, KnowledgeError> {
        let response = self
            .request(reqwest::Method::GET, &self.table_url())
            .query(&[("select", "id")])
            .header("Prefer", "count=exact")
            .header("Range-Unit", "items")
            .header("Range", "0-0")
            .send()
            .await
            .map_err(|e| KnowledgeError::Query(e.to_string()))?;

        let response = check(response).await.map_err(KnowledgeError::Query)?;
        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| KnowledgeError::Query("missing Content-Range in count response".into()))
    }
}
