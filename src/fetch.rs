//! Example retrieval by file name.
//!
//! Resolves a name directly under the corpus root (an exact join, not a
//! search) and returns the file's text. Used by both the `csla-mcp fetch`
//! CLI command and the `fetch` tool.

use anyhow::Result;
use std::path::{Component, Path};

use crate::config::{Config, CorpusConfig};
use crate::error::{CorpusError, CorpusResult};

/// Core fetch function returning the file content (used by CLI and server).
///
/// Names may contain subdirectories (`v9/Customer.cs`) but must stay inside
/// the corpus root: empty, absolute, and `..` names are rejected.
pub fn fetch_example(corpus: &CorpusConfig, name: &str) -> CorpusResult<String> {
    let relative = validate_name(name)?;
    let path = corpus.root.join(relative);

    if !path.is_file() {
        return Err(CorpusError::not_found(name));
    }

    std::fs::read_to_string(&path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => CorpusError::not_found(name),
        _ => CorpusError::FileUnreadable { path, source },
    })
}

fn validate_name(name: &str) -> CorpusResult<&Path> {
    let invalid = || CorpusError::InvalidName {
        name: name.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid());
    }

    let path = Path::new(name);
    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(invalid());
    }

    Ok(path)
}

/// CLI entry point: prints the example to stdout, or exits 1 if it is missing.
pub fn run_fetch(config: &Config, name: &str) -> Result<()> {
    let content = match fetch_example(&config.corpus, name) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    print!("{}", content);
    if !content.ends_with('\n') {
        println!();
    }

    Ok(())
}
