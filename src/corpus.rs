//! File corpus provider.
//!
//! Walks the corpus root recursively and yields every file matching the
//! configured include globs (by default `**/*.cs` and `**/*.md`). There is
//! no index: each call rescans the file system.
//!
//! Failure policy:
//! - root missing or not enumerable → [`CorpusError::CorpusUnavailable`]
//! - one file (or subdirectory) unreadable → logged and skipped

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::CorpusConfig;
use crate::error::{CorpusError, CorpusResult};
use crate::models::Document;

/// A file discovered under the corpus root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusEntry {
    pub path: PathBuf,
    /// Relative to the root, forward slashes.
    pub relative: String,
}

/// List all eligible files under the corpus root, sorted by relative path.
pub fn list_entries(config: &CorpusConfig) -> CorpusResult<Vec<CorpusEntry>> {
    let root = &config.root;
    std::fs::read_dir(root).map_err(|e| CorpusError::unavailable(root, e))?;

    let include_set = build_globset(&config.include_globs)?;
    let exclude_set = build_globset(&config.exclude_globs)?;

    let mut entries = Vec::new();

    let walker = WalkDir::new(root).follow_links(config.follow_symlinks);
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop at corpus root"));
                return Err(CorpusError::unavailable(root, source));
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable corpus entry");
                continue;
            }
        };
        // Without `follow_symlinks` walkdir reports links as links; a link to
        // a file is still an example.
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }

        let path = entry.path();
        let relative = normalize_relative(path.strip_prefix(root).unwrap_or(path));

        if exclude_set.is_match(&relative) {
            continue;
        }
        if !include_set.is_match(&relative) {
            continue;
        }

        entries.push(CorpusEntry {
            path: path.to_path_buf(),
            relative,
        });
    }

    entries.sort_by(|a, b| a.relative.cmp(&b.relative));

    Ok(entries)
}

/// Read one entry's full text.
pub fn read_document(entry: &CorpusEntry) -> CorpusResult<Document> {
    let content =
        std::fs::read_to_string(&entry.path).map_err(|source| CorpusError::FileUnreadable {
            path: entry.path.clone(),
            source,
        })?;

    Ok(Document {
        path: entry.relative.clone(),
        content,
    })
}

/// Read every eligible document, skipping files that cannot be read.
pub fn load_documents(config: &CorpusConfig) -> CorpusResult<Vec<Document>> {
    let entries = list_entries(config)?;
    let mut documents = Vec::with_capacity(entries.len());

    for entry in &entries {
        match read_document(entry) {
            Ok(doc) => documents.push(doc),
            Err(e) => tracing::warn!(error = %e, "skipping example"),
        }
    }

    Ok(documents)
}

/// Version an example belongs to, from a leading `v<N>/` directory.
///
/// `v9/Customer.cs` → `Some(9)`; `Customer.cs` or `docs/v9.md` → `None`.
pub fn detect_version(relative: &str) -> Option<u32> {
    let (first, _rest) = relative.split_once('/')?;
    let digits = first.strip_prefix('v').or_else(|| first.strip_prefix('V'))?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn normalize_relative(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn build_globset(patterns: &[String]) -> CorpusResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| CorpusError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| CorpusError::InvalidPattern {
        pattern: patterns.join(", "),
        source,
    })
}
