//! Knowledge ingestion for Tribuna.
//!
//! An uploaded PDF goes through three phases:
//!
//! 1. **Extract**: per-page text via `lopdf`, on the blocking thread pool
//! 2. **Split**: recursive character splitting with overlap
//! 3. **Replace**: the whole knowledge base is swapped for the new chunks
//!
//! Extraction and splitting finish before the store is touched, so a broken
//! upload never empties the existing knowledge base.

pub mod pdf;
pub mod pipeline;
pub mod splitter;

pub use pdf::{PageText, PdfText, extract_pages};
pub use pipeline::{IngestError, IngestPipeline, IngestReport, is_pdf_filename};
pub use splitter::RecursiveSplitter;
