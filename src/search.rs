//! Keyword search over the example corpus.
//!
//! # Scoring Algorithm
//!
//! 1. Tokenize the query: split on whitespace and common punctuation, keep
//!    tokens longer than 3 characters, lower-case, deduplicate.
//! 2. No search words → empty result, the corpus is not touched.
//! 3. For every document, count non-overlapping, case-insensitive
//!    occurrences of each word (substring match: `class` hits `classes`).
//! 4. Score = sum of counts. Zero-score documents are dropped.
//! 5. Sort by score (desc), then base file name (asc, ordinal).
//!
//! Scores are raw counts: no length normalization, no rarity weighting.

use anyhow::Result;
use std::collections::HashSet;

use crate::config::{Config, CorpusConfig};
use crate::corpus;
use crate::error::CorpusResult;
use crate::models::{Document, SearchResult, WordMatch};

/// Characters that separate query tokens, in addition to whitespace.
const SEPARATORS: &[char] = &[
    ' ', '\t', '\n', '\r', '.', ',', ';', ':', '!', '?', '(', ')', '[', ']', '{', '}', '"', '\'',
    '-', '_',
];

/// Tokens this long or shorter are ignored.
const MAX_IGNORED_LEN: usize = 3;

/// Extract search words from a free-text query, in order of first occurrence.
pub fn tokenize(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    query
        .split(|c: char| c.is_whitespace() || SEPARATORS.contains(&c))
        .filter(|token| token.chars().count() > MAX_IGNORED_LEN)
        .map(str::to_lowercase)
        .filter(|word| seen.insert(word.clone()))
        .collect()
}

/// Count non-overlapping occurrences of `word` in already lower-cased text.
///
/// The scan resumes right after each match, so `"aaaa"` contains `"aa"` twice.
pub fn count_occurrences(haystack: &str, word: &str) -> usize {
    if word.is_empty() {
        return 0;
    }
    haystack.matches(word).count()
}

/// Score one document. Returns `None` when no search word occurs in it.
pub fn score_document(doc: &Document, words: &[String]) -> Option<SearchResult> {
    let content = doc.content.to_lowercase();

    let matching_words: Vec<WordMatch> = words
        .iter()
        .filter_map(|word| match count_occurrences(&content, word) {
            0 => None,
            count => Some(WordMatch {
                word: word.clone(),
                count,
            }),
        })
        .collect();

    let score: usize = matching_words.iter().map(|m| m.count).sum();
    if score == 0 {
        return None;
    }

    Some(SearchResult {
        score,
        file_name: doc.file_name().to_string(),
        matching_words,
    })
}

/// Score and rank a set of documents against pre-tokenized search words.
pub fn rank(documents: &[Document], words: &[String]) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = documents
        .iter()
        .filter_map(|doc| score_document(doc, words))
        .collect();

    results.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.file_name.cmp(&b.file_name))
    });

    results
}

/// Search the corpus for `query`.
///
/// This is the core function the CLI, HTTP API, and MCP tool delegate to.
/// Fails only when the corpus root itself is unavailable.
pub fn search_examples(corpus: &CorpusConfig, query: &str) -> CorpusResult<Vec<SearchResult>> {
    let words = tokenize(query);
    if words.is_empty() {
        return Ok(Vec::new());
    }

    let documents = corpus::load_documents(corpus)?;
    let results = rank(&documents, &words);

    tracing::debug!(
        words = ?words,
        documents = documents.len(),
        hits = results.len(),
        "search complete"
    );

    Ok(results)
}

/// CLI entry point: runs the search and prints a table (or JSON) to stdout.
pub fn run_search(config: &Config, query: &str, json: bool) -> Result<()> {
    let results = search_examples(&config.corpus, query)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    println!("{:<6} {:<40} MATCHES", "SCORE", "FILE");
    for result in &results {
        let matches: Vec<String> = result
            .matching_words
            .iter()
            .map(|m| format!("{}={}", m.word, m.count))
            .collect();
        println!(
            "{:<6} {:<40} {}",
            result.score,
            result.file_name,
            matches.join(", ")
        );
    }

    Ok(())
}
