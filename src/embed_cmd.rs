//! `csla-mcp embed`: embeddings batch job.
//!
//! Reads every example in the corpus, sends its raw content to the
//! embedding API one file at a time, and writes a JSON array of
//! [`EmbeddingRecord`]s. It performs no ranking or search.
//!
//! Settings come from the environment:
//!
//! | Variable | Required | Default |
//! |----------|----------|---------|
//! | `AZURE_OPENAI_ENDPOINT` | yes | |
//! | `AZURE_OPENAI_API_KEY` | yes | |
//! | `AZURE_OPENAI_EMBEDDING_MODEL` | no | `text-embedding-3-large` |
//! | `AZURE_OPENAI_API_VERSION` | no | `2024-02-01` |
//!
//! Exit codes: `0` success, `1` failure, `3` examples directory missing,
//! `4` endpoint missing, `5` API key missing.

use anyhow::Context;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::{Config, CorpusConfig};
use crate::corpus;
use crate::embedding::{AzureOpenAiEmbedder, Embedder};
use crate::models::EmbeddingRecord;

pub const ENDPOINT_VAR: &str = "AZURE_OPENAI_ENDPOINT";
pub const API_KEY_VAR: &str = "AZURE_OPENAI_API_KEY";
pub const MODEL_VAR: &str = "AZURE_OPENAI_EMBEDDING_MODEL";
pub const API_VERSION_VAR: &str = "AZURE_OPENAI_API_VERSION";

const DEFAULT_MODEL: &str = "text-embedding-3-large";
const DEFAULT_API_VERSION: &str = "2024-02-01";

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("examples directory not found: {}", .0.display())]
    ExamplesDirMissing(PathBuf),

    #[error("embedding endpoint not configured: set AZURE_OPENAI_ENDPOINT")]
    EndpointMissing,

    #[error("embedding API key not configured: set AZURE_OPENAI_API_KEY")]
    ApiKeyMissing,

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl EmbedError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Failed(_) => 1,
            Self::ExamplesDirMissing(_) => 3,
            Self::EndpointMissing => 4,
            Self::ApiKeyMissing => 5,
        }
    }
}

/// Resolved embedding service settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedSettings {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub api_version: String,
}

impl EmbedSettings {
    /// Resolve settings through `lookup`. Blank values count as missing.
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EmbedError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let endpoint = get(ENDPOINT_VAR).ok_or(EmbedError::EndpointMissing)?;
        let api_key = get(API_KEY_VAR).ok_or(EmbedError::ApiKeyMissing)?;

        Ok(Self {
            endpoint,
            api_key,
            model: get(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_version: get(API_VERSION_VAR).unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        })
    }

    pub fn from_env() -> Result<Self, EmbedError> {
        Self::resolve(|key| std::env::var(key).ok())
    }
}

/// Outcome of one batch run.
#[derive(Debug, Default)]
pub struct EmbedReport {
    pub records: Vec<EmbeddingRecord>,
    pub total: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Embed every example in the corpus, one request per file.
///
/// Unreadable and blank files are skipped; files whose embedding fails are
/// logged and counted. Only an unavailable corpus aborts the run.
pub async fn generate_embeddings<E: Embedder + ?Sized>(
    corpus_config: &CorpusConfig,
    embedder: &E,
) -> anyhow::Result<EmbedReport> {
    let entries = corpus::list_entries(corpus_config)?;
    let mut report = EmbedReport {
        total: entries.len(),
        ..EmbedReport::default()
    };

    for (i, entry) in entries.iter().enumerate() {
        let doc = match corpus::read_document(entry) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(error = %e, "skipping example");
                report.skipped += 1;
                continue;
            }
        };
        if doc.content.trim().is_empty() {
            tracing::debug!(file = %doc.path, "skipping blank example");
            report.skipped += 1;
            continue;
        }

        tracing::info!(
            file = %doc.path,
            "embedding {}/{} with {}",
            i + 1,
            report.total,
            embedder.model_name()
        );

        match embedder.embed(&doc.content).await {
            Ok(embedding) => {
                let version = corpus::detect_version(&doc.path);
                report.records.push(EmbeddingRecord {
                    file_name: doc.path,
                    content: doc.content,
                    embedding,
                    version,
                });
            }
            Err(e) => {
                tracing::warn!(file = %doc.path, error = %e, "embedding failed");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Write records as a pretty-printed JSON array, creating parent directories.
pub fn write_records(path: &Path, records: &[EmbeddingRecord]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

/// CLI entry point. Validates the examples directory, then the environment,
/// then embeds the corpus and writes `output`.
pub async fn run_embed(config: &Config, output: &Path) -> Result<(), EmbedError> {
    let root = &config.corpus.root;
    if !root.is_dir() {
        return Err(EmbedError::ExamplesDirMissing(root.clone()));
    }

    let settings = EmbedSettings::from_env()?;
    let embedder = AzureOpenAiEmbedder::new(
        &settings.endpoint,
        &settings.model,
        &settings.api_version,
        &settings.api_key,
        &config.embedding,
    )?;
    tracing::info!(url = embedder.url(), root = %root.display(), "generating embeddings");

    let report = generate_embeddings(&config.corpus, &embedder).await?;
    write_records(output, &report.records)?;

    println!("embed");
    println!("  total files: {}", report.total);
    println!("  embedded: {}", report.records.len());
    println!("  failed: {}", report.failed);
    println!("  skipped: {}", report.skipped);
    println!("  output: {}", output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    /// Embeds a text as `[byte length]`; fails for texts containing "FAIL".
    struct LengthEmbedder;

    #[async_trait]
    impl Embedder for LengthEmbedder {
        fn model_name(&self) -> &str {
            "length"
        }

        async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            if text.contains("FAIL") {
                bail!("refused");
            }
            Ok(vec![text.len() as f32])
        }
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_settings_defaults() {
        let settings = EmbedSettings::resolve(lookup(&[
            (ENDPOINT_VAR, "https://x.openai.azure.com"),
            (API_KEY_VAR, "k"),
        ]))
        .unwrap();
        assert_eq!(settings.endpoint, "https://x.openai.azure.com");
        assert_eq!(settings.model, "text-embedding-3-large");
        assert_eq!(settings.api_version, "2024-02-01");
    }

    #[test]
    fn test_settings_overrides() {
        let settings = EmbedSettings::resolve(lookup(&[
            (ENDPOINT_VAR, "e"),
            (API_KEY_VAR, "k"),
            (MODEL_VAR, "small"),
            (API_VERSION_VAR, "2025-01-01"),
        ]))
        .unwrap();
        assert_eq!(settings.model, "small");
        assert_eq!(settings.api_version, "2025-01-01");
    }

    #[test]
    fn test_settings_missing_endpoint_then_key() {
        let err = EmbedSettings::resolve(lookup(&[(API_KEY_VAR, "k")])).unwrap_err();
        assert!(matches!(err, EmbedError::EndpointMissing));
        assert_eq!(err.exit_code(), 4);

        let err = EmbedSettings::resolve(lookup(&[(ENDPOINT_VAR, "e"), (API_KEY_VAR, "  ")]))
            .unwrap_err();
        assert!(matches!(err, EmbedError::ApiKeyMissing));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            EmbedError::Failed(anyhow::anyhow!("x")).exit_code(),
            EmbedError::ExamplesDirMissing(PathBuf::from("x")).exit_code(),
            EmbedError::EndpointMissing.exit_code(),
            EmbedError::ApiKeyMissing.exit_code(),
        ];
        assert_eq!(codes, [1, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_run_embed_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let config = Config::default().with_corpus_root(Some(tmp.path().join("missing")));
        let err = run_embed(&config, &tmp.path().join("out.json"))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_generate_embeddings() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("v9")).unwrap();
        fs::write(root.join("Guide.md"), "# Guide").unwrap();
        fs::write(root.join("v9/Customer.cs"), "class Customer {}").unwrap();
        fs::write(root.join("Broken.cs"), "FAIL").unwrap();
        fs::write(root.join("Blank.md"), "  \n").unwrap();
        fs::write(root.join("ignored.txt"), "text").unwrap();

        let corpus_config = CorpusConfig {
            root: root.to_path_buf(),
            ..CorpusConfig::default()
        };
        let report = generate_embeddings(&corpus_config, &LengthEmbedder)
            .await
            .unwrap();

        assert_eq!(report.total, 4);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.records.len(), 2);

        let guide = &report.records[0];
        assert_eq!(guide.file_name, "Guide.md");
        assert_eq!(guide.content, "# Guide");
        assert_eq!(guide.embedding, vec![7.0]);
        assert_eq!(guide.version, None);

        let customer = &report.records[1];
        assert_eq!(customer.file_name, "v9/Customer.cs");
        assert_eq!(customer.version, Some(9));
    }

    #[tokio::test]
    async fn test_generate_embeddings_missing_corpus_fails() {
        let tmp = TempDir::new().unwrap();
        let corpus_config = CorpusConfig {
            root: tmp.path().join("missing"),
            ..CorpusConfig::default()
        };
        assert!(generate_embeddings(&corpus_config, &LengthEmbedder)
            .await
            .is_err());
    }

    #[test]
    fn test_write_records_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out/nested/embeddings.json");
        let records = vec![EmbeddingRecord {
            file_name: "v10/Rules.md".to_string(),
            content: "# Rules".to_string(),
            embedding: vec![0.5],
            version: Some(10),
        }];
        write_records(&path, &records).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written[0]["FileName"], "v10/Rules.md");
        assert_eq!(written[0]["Version"], 10);
        assert_eq!(written[0]["Embedding"][0], 0.5);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_records_reports_full_device() {
        let records = vec![EmbeddingRecord {
            file_name: "Guide.md".to_string(),
            content: "# Guide".to_string(),
            embedding: vec![1.0],
            version: None,
        }];
        let err = write_records(Path::new("/dev/full"), &records).unwrap_err();
        assert!(err.to_string().contains("/dev/full"));
    }
}
