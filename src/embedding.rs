//! HTTP embedding backends.
//!
//! Two implementations of [`Embedder`]:
//! - **[`OllamaEmbedder`]** calls `POST {url}/api/embed` on an Ollama instance.
//! - **[`OpenAiEmbedder`]** calls `POST {url}/v1/embeddings` on any
//!   OpenAI-compatible endpoint.
//!
//! Use [`create_embedder`] to pick one from configuration:
//!
//! ```rust,no_run
//! # use ragkb::config::EmbeddingConfig;
//! # use ragkb::embedding::create_embedder;
//! let config = EmbeddingConfig::default(); // provider = "ollama"
//! let embedder = create_embedder(&config).unwrap();
//! assert_eq!(embedder.name(), "ollama");
//! ```
//!
//! # Retry Strategy
//!
//! Both backends use exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use ragkb_core::embedding::Embedder;

use crate::config::EmbeddingConfig;

/// Build the configured embedder.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    let http = HttpClient::new(config)?;
    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaEmbedder { http })),
        "openai" => Ok(Arc::new(OpenAiEmbedder { http })),
        other => bail!(
            "Unknown embedding provider: '{}'. Must be ollama or openai.",
            other
        ),
    }
}

/// Shared request plumbing: one `reqwest::Client`, base URL, optional
/// bearer token, and the retry budget.
struct HttpClient {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    max_retries: u32,
}

impl HttpClient {
    fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
            max_retries: config.max_retries,
        })
    }

    /// POST `body` to `{url}{path}` and return the decoded JSON response.
    async fn post_json(
        &self,
        label: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let endpoint = format!("{}{}", self.url, path);
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                tracing::warn!(
                    backend = label,
                    attempt,
                    delay_secs = delay.as_secs(),
                    "retrying embedding request"
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = self.client.post(&endpoint).json(body);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return response
                            .json()
                            .await
                            .with_context(|| format!("{} returned invalid JSON", label));
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(anyhow!("{} API error {}: {}", label, status, body_text));
                        continue;
                    }

                    bail!("{} API error {}: {}", label, status, body_text);
                }
                Err(e) => {
                    last_err = Some(anyhow!(
                        "{} connection error (is it reachable at {}?): {}",
                        label,
                        self.url,
                        e
                    ));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("{} embedding failed after retries", label)))
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1 << (attempt - 1).min(5))
}

// ============ Ollama ============

/// Embedder backed by an Ollama instance (default `http://localhost:11434`).
///
/// Requires the model to be pulled first (e.g. `ollama pull mxbai-embed-large`).
pub struct OllamaEmbedder {
    http: HttpClient,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn embed(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": model,
            "input": texts,
        });
        let json = self.http.post_json("Ollama", "/api/embed", &body).await?;
        parse_ollama_response(&json)
    }
}

fn parse_ollama_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let embeddings = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| anyhow!("Invalid Ollama response: missing embeddings array"))?;

    embeddings
        .iter()
        .map(|embedding| {
            embedding
                .as_array()
                .ok_or_else(|| anyhow!("Invalid Ollama response: embedding is not an array"))
                .and_then(|values| to_vector(values))
        })
        .collect()
}

// ============ OpenAI-compatible ============

/// Embedder for the OpenAI embeddings API or a compatible server.
///
/// Sends `embedding.token` as a bearer token when configured.
pub struct OpenAiEmbedder {
    http: HttpClient,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn name(&self) -> &str {
        "openai"
    }

    async fn embed(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": model,
            "input": texts,
        });
        let json = self.http.post_json("OpenAI", "/v1/embeddings", &body).await?;
        parse_openai_response(&json)
    }
}

/// Extract `data[].embedding`, ordered by `data[].index` when present.
fn parse_openai_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| anyhow!("Invalid OpenAI response: missing data array"))?;

    let mut indexed = Vec::with_capacity(data.len());
    for (position, item) in data.iter().enumerate() {
        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .map(|i| i as usize)
            .unwrap_or(position);
        let values = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| anyhow!("Invalid OpenAI response: missing embedding"))?;
        indexed.push((index, to_vector(values)?));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

fn to_vector(values: &[serde_json::Value]) -> Result<Vec<f32>> {
    values
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| anyhow!("Invalid embedding value: {}", v))
        })
        .collect()
}
