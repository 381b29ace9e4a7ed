//! Ollama-style local LLM client.

use std::time::{Duration, Instant};

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use notewise_core::{defaults, Error, Result};

use crate::config::{GenerationOptions, LlmConfig};
use crate::streaming::{parse_ndjson_stream, GenerationStream};

/// Generations slower than this are logged at WARN.
const SLOW_GENERATION_MS: u64 = 30_000;

/// Request payload for `POST /api/generate`.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: &'a GenerationOptions,
}

/// Response of `POST /api/generate`, or one fragment of a streamed response.
///
/// Durations are in nanoseconds, as the server reports them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_duration: Option<u64>,
}

impl GenerateResponse {
    /// Generation speed, when the server reported eval timing.
    pub fn tokens_per_second(&self) -> Option<f64> {
        match (self.eval_count, self.eval_duration) {
            (Some(count), Some(ns)) if ns > 0 => Some(count as f64 / (ns as f64 / 1e9)),
            _ => None,
        }
    }

    pub fn total_time(&self) -> Option<Duration> {
        self.total_duration.map(Duration::from_nanos)
    }
}

/// One installed model as listed by `GET /api/tags`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

impl ModelInfo {
    /// Whether this entry satisfies a requested model name.
    ///
    /// An untagged request matches the `:latest` tag.
    pub fn matches(&self, requested: &str) -> bool {
        if self.name == requested {
            return true;
        }
        !requested.contains(':') && self.name == format!("{requested}:latest")
    }
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

/// HTTP JSON client for an Ollama-compatible server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    config: LlmConfig,
    base_url: String,
}

impl OllamaClient {
    /// Create a client. Fails with `Error::Config` on an invalid config.
    pub fn new(config: LlmConfig) -> Result<Self> {
        config.validate()?;
        let base_url = config.parsed_base_url()?.as_str().trim_end_matches('/').to_string();

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "ollama",
            base_url = %base_url,
            model = %config.model,
            "Initializing LLM client"
        );

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(LlmConfig::from_env())
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// List installed models.
    #[instrument(skip(self), fields(subsystem = "inference", component = "ollama", op = "list_models"))]
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .timeout(Duration::from_secs(defaults::LLM_PROBE_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let tags: TagsResponse = check_status(response).await?.json().await?;
        debug!(result_count = tags.models.len(), "Listed models");
        Ok(tags.models)
    }

    /// Fail with `Error::ModelNotFound` unless the configured model is installed.
    pub async fn ensure_model(&self) -> Result<()> {
        let models = self.list_models().await?;
        if models.iter().any(|m| m.matches(&self.config.model)) {
            Ok(())
        } else {
            warn!(
                model = %self.config.model,
                available = models.len(),
                "Configured model is not installed"
            );
            Err(Error::ModelNotFound(self.config.model.clone()))
        }
    }

    /// Generate a full response in one request.
    #[instrument(skip(self, prompt), fields(subsystem = "inference", component = "ollama", op = "generate", model = %self.config.model, prompt_len = prompt.len()))]
    pub async fn generate(&self, prompt: &str) -> Result<GenerateResponse> {
        self.ensure_model().await?;
        let start = Instant::now();

        let response = self.send_generate(prompt, false).await?;
        let result: GenerateResponse = response.json().await?;

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            response_len = result.response.len(),
            eval_count = ?result.eval_count,
            duration_ms = elapsed,
            "Generation complete"
        );
        if elapsed > SLOW_GENERATION_MS {
            warn!(
                duration_ms = elapsed,
                prompt_len = prompt.len(),
                slow = true,
                "Slow generation operation"
            );
        }
        Ok(result)
    }

    /// Generate with a streamed NDJSON response.
    #[instrument(skip(self, prompt), fields(subsystem = "inference", component = "ollama", op = "generate_stream", model = %self.config.model, prompt_len = prompt.len()))]
    pub async fn generate_stream(&self, prompt: &str) -> Result<GenerationStream> {
        self.ensure_model().await?;
        let response = self.send_generate(prompt, true).await?;
        debug!("Streaming generation started");
        Ok(parse_ndjson_stream(response.bytes_stream()))
    }

    /// Whether the server answers at all.
    pub async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .timeout(Duration::from_secs(defaults::LLM_PROBE_TIMEOUT_SECS))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!("LLM health check passed");
                Ok(true)
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "LLM health check failed");
                Ok(false)
            }
            Err(e) => {
                warn!(error = %e, "LLM health check error");
                Ok(false)
            }
        }
    }

    async fn send_generate(&self, prompt: &str, stream: bool) -> Result<Response> {
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream,
            options: &self.config.options,
        };

        let response = self
            .client
            .post(self.url("/api/generate"))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        check_status(response).await
    }

    fn request_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout(self.config.timeout().as_millis() as u64)
        } else {
            Error::from(e)
        }
    }
}

/// Map a non-2xx response to `Error::Server` with the body as message.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or(body);
    Err(Error::Server {
        status: status.as_u16(),
        message,
    })
}
