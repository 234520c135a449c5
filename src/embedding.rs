//! Embedding API client.
//!
//! Defines the [`Embedder`] trait and [`AzureOpenAiEmbedder`], which calls an
//! Azure OpenAI-style deployment:
//!
//! ```text
//! POST {endpoint}/openai/deployments/{model}/embeddings?api-version={version}
//! api-key: <key>
//! { "input": "<file content>" }
//! ```
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::EmbeddingConfig;

/// Turns a text into an embedding vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model (deployment) identifier, for logging.
    fn model_name(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Embedder backed by an Azure OpenAI embeddings deployment.
pub struct AzureOpenAiEmbedder {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    max_retries: u32,
}

impl AzureOpenAiEmbedder {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_version: &str,
        api_key: &str,
        config: &EmbeddingConfig,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: embeddings_url(endpoint, model, api_version),
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_retries: config.max_retries,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Embedder for AzureOpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = serde_json::json!({ "input": text });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tracing::debug!(attempt, delay_secs = delay.as_secs(), "retrying embedding request");
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&self.url)
                .header("api-key", &self.api_key)
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_embedding_response(&json);
                    }

                    // Rate limited or server error, retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(anyhow::anyhow!(
                            "Embedding API error {}: {}",
                            status,
                            body_text
                        ));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("Embedding API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Embedding failed after retries")))
    }
}

/// Build the deployment embeddings URL. A trailing `/` on the endpoint is ignored.
pub fn embeddings_url(endpoint: &str, model: &str, api_version: &str) -> String {
    format!(
        "{}/openai/deployments/{}/embeddings?api-version={}",
        endpoint.trim_end_matches('/'),
        model,
        api_version
    )
}

/// Extract `data[0].embedding` from the API response.
fn parse_embedding_response(json: &serde_json::Value) -> Result<Vec<f32>> {
    let embedding = json
        .get("data")
        .and_then(|d| d.as_array())
        .and_then(|d| d.first())
        .and_then(|item| item.get("embedding"))
        .and_then(|e| e.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid embedding response: missing data[0].embedding"))?;

    embedding
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| anyhow::anyhow!("Invalid embedding response: non-numeric value"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_embeddings_url() {
        assert_eq!(
            embeddings_url("https://example.openai.azure.com/", "text-embedding-3-large", "2024-02-01"),
            "https://example.openai.azure.com/openai/deployments/text-embedding-3-large/embeddings?api-version=2024-02-01"
        );
        assert_eq!(
            embeddings_url("http://localhost:9000", "m", "v"),
            "http://localhost:9000/openai/deployments/m/embeddings?api-version=v"
        );
    }

    #[test]
    fn test_parse_response() {
        let json = serde_json::json!({
            "object": "list",
            "data": [{ "object": "embedding", "index": 0, "embedding": [0.25, -1.0, 0.0] }],
            "model": "text-embedding-3-large"
        });
        assert_eq!(parse_embedding_response(&json).unwrap(), vec![0.25, -1.0, 0.0]);
    }

    #[test]
    fn test_parse_response_rejects_bad_shapes() {
        assert!(parse_embedding_response(&serde_json::json!({})).is_err());
        assert!(parse_embedding_response(&serde_json::json!({ "data": [] })).is_err());
        assert!(parse_embedding_response(&serde_json::json!({
            "data": [{ "embedding": ["x"] }]
        }))
        .is_err());
    }

    /// Serves a fake embeddings deployment that fails with `statuses` in
    /// order before succeeding. Returns the endpoint and a request counter.
    async fn fake_endpoint(statuses: Vec<StatusCode>) -> (String, Arc<AtomicUsize>) {
        #[derive(Clone)]
        struct Fake {
            calls: Arc<AtomicUsize>,
            statuses: Arc<Vec<StatusCode>>,
        }

        async fn handle(
            State(fake): State<Fake>,
            headers: HeaderMap,
            Json(body): Json<serde_json::Value>,
        ) -> (StatusCode, Json<serde_json::Value>) {
            let n = fake.calls.fetch_add(1, Ordering::SeqCst);
            if headers.get("api-key").and_then(|v| v.to_str().ok()) != Some("secret") {
                return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({})));
            }
            if let Some(status) = fake.statuses.get(n) {
                return (*status, Json(serde_json::json!({ "error": "fail" })));
            }
            let len = body["input"].as_str().unwrap_or_default().len() as f64;
            (
                StatusCode::OK,
                Json(serde_json::json!({ "data": [{ "embedding": [len, 0.5] }] })),
            )
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/openai/deployments/{model}/embeddings", post(handle))
            .with_state(Fake {
                calls: calls.clone(),
                statuses: Arc::new(statuses),
            });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), calls)
    }

    fn test_config(max_retries: u32) -> EmbeddingConfig {
        EmbeddingConfig {
            max_retries,
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn test_embed_success() {
        let (endpoint, calls) = fake_endpoint(vec![]).await;
        let embedder =
            AzureOpenAiEmbedder::new(&endpoint, "m", "2024-02-01", "secret", &test_config(0)).unwrap();

        let vec = embedder.embed("hello").await.unwrap();
        assert_eq!(vec, vec![5.0, 0.5]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(embedder.model_name(), "m");
    }

    #[tokio::test]
    async fn test_embed_retries_server_errors() {
        let (endpoint, calls) = fake_endpoint(vec![StatusCode::SERVICE_UNAVAILABLE]).await;
        let embedder =
            AzureOpenAiEmbedder::new(&endpoint, "m", "v", "secret", &test_config(2)).unwrap();

        let vec = embedder.embed("abc").await.unwrap();
        assert_eq!(vec, vec![3.0, 0.5]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_embed_client_error_not_retried() {
        let (endpoint, calls) = fake_endpoint(vec![]).await;
        let embedder =
            AzureOpenAiEmbedder::new(&endpoint, "m", "v", "wrong-key", &test_config(3)).unwrap();

        let err = embedder.embed("abc").await.unwrap_err();
        assert!(err.to_string().contains("401"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
