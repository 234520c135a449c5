//! Core data models used throughout csla-mcp.
//!
//! The serialized field names (`Score`, `FileName`, `MatchingWords`, ...)
//! are the wire shape existing MCP clients expect from the `search` tool
//! and from the embeddings file.

use serde::{Deserialize, Serialize};

/// One example file, read for the duration of a single call.
#[derive(Debug, Clone)]
pub struct Document {
    /// Path relative to the corpus root, with forward slashes.
    pub path: String,
    pub content: String,
}

impl Document {
    /// Base file name: the last component of [`path`](Document::path).
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Occurrence count of one search word in one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WordMatch {
    pub word: String,
    pub count: usize,
}

/// A ranked search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchResult {
    /// Sum of all word counts.
    pub score: usize,
    /// Base name only, not the full path.
    pub file_name: String,
    /// In search-word extraction order; zero counts are never present.
    pub matching_words: Vec<WordMatch>,
}

/// One entry of the embeddings output file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmbeddingRecord {
    pub file_name: String,
    pub content: String,
    pub embedding: Vec<f32>,
    pub version: Option<u32>,
}
