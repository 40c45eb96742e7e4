//! Recursive character text splitter.
//!
//! Text is split on the first separator (in priority order) that occurs in
//! it. Pieces shorter than the chunk size are merged greedily up to the chunk
//! size, carrying up to `chunk_overlap` characters into the next chunk.
//! Pieces that are still too long are split again with the remaining
//! separators. Separators stay attached to the start of the piece that
//! follows them, and lengths are counted in characters, not bytes.

use std::collections::VecDeque;

use tracing::warn;

const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split at every occurrence of `separator`, keeping it at the start of the
/// following piece. An empty separator splits into characters.
fn split_keep_start<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        pieces.push(&text[start..idx]);
        start = idx;
    }
    pieces.push(&text[start..]);
    pieces.retain(|p| !p.is_empty());
    pieces
}

/// Concatenate and trim; `None` when nothing but whitespace is left.
fn join(pieces: &VecDeque<&str>) -> Option<String> {
    let joined: String = pieces.iter().copied().collect();
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl RecursiveSplitter {
    /// Overlap is clamped below the chunk size.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn from_config(config: &tribuna_config::IngestConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Replace the separator priority list.
    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let (separator, remaining) = pick_separator(text, separators);
        let mut chunks = Vec::new();
        let mut short: Vec<&str> = Vec::new();

        for piece in split_keep_start(text, separator) {
            if char_len(piece) < self.chunk_size {
                short.push(piece);
                continue;
            }
            if !short.is_empty() {
                chunks.extend(self.merge(&short));
                short.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_with(piece, remaining));
            }
        }

        if !short.is_empty() {
            chunks.extend(self.merge(&short));
        }
        chunks
    }

    /// Greedily merge short pieces into chunks with overlap.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        size = total,
                        chunk_size = self.chunk_size,
                        "Created a chunk longer than the configured size"
                    );
                }
                if !current.is_empty() {
                    chunks.extend(join(&current));
                    while total > self.chunk_overlap || (total > 0 && total + len > self.chunk_size) {
                        match current.pop_front() {
                            Some(front) => total -= char_len(front),
                            None => break,
                        }
                    }
                }
            }
            current.push_back(piece);
            total += len;
        }

        chunks.extend(join(&current));
        chunks
    }
}

/// The first separator present in `text`, and the ones after it. An empty
/// separator matches anything and ends the list.
fn pick_separator<'s>(text: &str, separators: &'s [String]) -> (&'s str, &'s [String]) {
    for (i, separator) in separators.iter().enumerate() {
        if separator.is_empty() {
            return ("", &separators[..0]);
        }
        if text.contains(separator.as_str()) {
            return (separator.as_str(), &separators[i + 1..]);
        }
    }
    (separators.last().map(String::as_str).unwrap_or(""), &separators[..0])
}
