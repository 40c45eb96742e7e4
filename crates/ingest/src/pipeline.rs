//! Replace-all ingestion of one PDF into the knowledge store.

use std::sync::Arc;

use tracing::{info, warn};
use tribuna_config::AppConfig;
use tribuna_core::error::KnowledgeError;
use tribuna_core::knowledge::{KnowledgeChunk, KnowledgeStore};

use crate::pdf::{PdfText, extract_pages_blocking};
use crate::splitter::RecursiveSplitter;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Only PDF files are accepted: {0}")]
    NotPdf(String),

    #[error("Could not read the PDF: {0}")]
    Extract(String),

    #[error("The PDF contains no extractable text")]
    NoText,

    #[error(transparent)]
    Store(#[from] KnowledgeError),
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub filename: String,
    /// Pages in the document, including blank ones.
    pub pages: u32,
    /// Chunks removed from the previous knowledge base.
    pub deleted: usize,
    /// Chunks now stored.
    pub created: usize,
}

impl IngestReport {
    /// User-facing summary.
    pub fn message(&self) -> String {
        format!(
            "Base de conocimiento actualizada. Eliminados: {} chunks, Creados: {} chunks",
            self.deleted, self.created
        )
    }
}

/// Case-insensitive `.pdf` suffix check.
pub fn is_pdf_filename(filename: &str) -> bool {
    filename.to_lowercase().ends_with(".pdf")
}

pub struct IngestPipeline {
    store: Arc<dyn KnowledgeStore>,
    splitter: RecursiveSplitter,
}

impl IngestPipeline {
    pub fn new(store: Arc<dyn KnowledgeStore>, splitter: RecursiveSplitter) -> Self {
        Self { store, splitter }
    }

    pub fn from_config(config: &AppConfig, store: Arc<dyn KnowledgeStore>) -> Self {
        Self::new(store, RecursiveSplitter::from_config(&config.ingest))
    }

    pub fn store(&self) -> &Arc<dyn KnowledgeStore> {
        &self.store
    }

    /// Split each page and tag the chunks with their source.
    pub fn chunk_pages(&self, filename: &str, text: &PdfText) -> Vec<KnowledgeChunk> {
        text.pages
            .iter()
            .flat_map(|page| {
                self.splitter
                    .split_text(&page.text)
                    .into_iter()
                    .map(move |chunk| KnowledgeChunk {
                        text: chunk,
                        filename: filename.to_string(),
                        page: Some(page.number),
                        total_pages: Some(text.total_pages),
                    })
            })
            .collect()
    }

    /// Replace the knowledge base with the contents of one PDF.
    pub async fn ingest(&self, filename: &str, bytes: Vec<u8>) -> Result<IngestReport, IngestError> {
        if !is_pdf_filename(filename) {
            return Err(IngestError::NotPdf(filename.to_string()));
        }

        let size = bytes.len();
        let text = extract_pages_blocking(bytes).await?;
        if text.is_empty() {
            warn!(filename, pages = text.total_pages, "PDF has no extractable text, knowledge base left unchanged");
            return Err(IngestError::NoText);
        }

        let chunks = self.chunk_pages(filename, &text);
        info!(
            filename,
            bytes = size,
            pages = text.total_pages,
            pages_with_text = text.pages.len(),
            chunks = chunks.len(),
            "PDF split, replacing knowledge base"
        );

        let outcome = self.store.replace_all(chunks).await?;
        info!(
            filename,
            deleted = outcome.deleted,
            created = outcome.created,
            store = self.store.name(),
            "Knowledge base replaced"
        );

        Ok(IngestReport {
            filename: filename.to_string(),
            pages: text.total_pages,
            deleted: outcome.deleted,
            created: outcome.created,
        })
    }
}
