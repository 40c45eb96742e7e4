//! Page text extraction from PDF bytes.

use lopdf::Document;
use tracing::{debug, warn};

use crate::pipeline::IngestError;

/// Text of one page, numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

/// Extracted pages with non-blank text, plus the document's page count.
#[derive(Debug, Clone)]
pub struct PdfText {
    pub pages: Vec<PageText>,
    pub total_pages: u32,
}

impl PdfText {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Parse `bytes` and extract the text of every page.
///
/// Pages whose text is blank, or whose content stream cannot be decoded,
/// are skipped. Only an unreadable document is an error.
pub fn extract_pages(bytes: &[u8]) -> Result<PdfText, IngestError> {
    let doc = Document::load_mem(bytes).map_err(|e| IngestError::Extract(e.to_string()))?;
    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    let total_pages = page_numbers.len() as u32;

    let mut pages = Vec::with_capacity(page_numbers.len());
    for number in page_numbers {
        match doc.extract_text(&[number]) {
            Ok(text) if !text.trim().is_empty() => pages.push(PageText { number, text }),
            Ok(_) => debug!(page = number, "Skipping page without text"),
            Err(e) => warn!(page = number, error = %e, "Could not extract page text, skipping"),
        }
    }

    Ok(PdfText { pages, total_pages })
}

/// [`extract_pages`] on the blocking thread pool.
pub async fn extract_pages_blocking(bytes: Vec<u8>) -> Result<PdfText, IngestError> {
    tokio::task::spawn_blocking(move || extract_pages(&bytes))
        .await
        .map_err(|e| IngestError::Extract(format!("extraction task failed: {e}")))?
}
