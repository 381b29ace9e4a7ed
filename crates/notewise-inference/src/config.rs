//! Local LLM client configuration.
//!
//! Configuration can be loaded from:
//! - Environment variables (`NOTEWISE_LLM_*` prefixed)
//! - The `llm` section of the user's preferences
//!
//! # Example
//!
//! ```rust,no_run
//! use notewise_inference::LlmConfig;
//!
//! let config = LlmConfig::from_env();
//! config.validate().expect("invalid LLM config");
//! ```

use std::env;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use notewise_core::{defaults, Error, LlmSettings, Result};

/// Sampling options sent with every generate request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub num_predict: i32,
    pub num_ctx: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: defaults::LLM_TEMPERATURE,
            top_k: defaults::LLM_TOP_K,
            top_p: defaults::LLM_TOP_P,
            num_predict: defaults::LLM_NUM_PREDICT,
            num_ctx: defaults::LLM_NUM_CTX,
        }
    }
}

/// Where the local LLM lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the Ollama-style server.
    pub base_url: String,
    /// Model used for generation.
    pub model: String,
    /// Timeout for generate requests (seconds).
    pub timeout_secs: u64,
    pub options: GenerationOptions,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::LLM_URL.to_string(),
            model: defaults::LLM_MODEL.to_string(),
            timeout_secs: defaults::LLM_TIMEOUT_SECS,
            options: GenerationOptions::default(),
        }
    }
}

impl From<&LlmSettings> for LlmConfig {
    fn from(settings: &LlmSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            model: settings.model.clone(),
            timeout_secs: settings.timeout_secs,
            options: GenerationOptions {
                temperature: settings.temperature,
                top_k: settings.top_k,
                top_p: settings.top_p,
                num_predict: settings.num_predict,
                num_ctx: settings.num_ctx,
            },
        }
    }
}

impl LlmConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `NOTEWISE_LLM_URL` | `http://127.0.0.1:11434` | Server base URL |
    /// | `NOTEWISE_LLM_MODEL` | `llama3.2:3b` | Generation model |
    /// | `NOTEWISE_LLM_TIMEOUT_SECS` | `120` | Generate request timeout |
    /// | `NOTEWISE_LLM_TEMPERATURE` | `0.7` | Sampling temperature |
    /// | `NOTEWISE_LLM_TOP_K` | `40` | Top-k cutoff |
    /// | `NOTEWISE_LLM_TOP_P` | `0.9` | Nucleus cutoff |
    /// | `NOTEWISE_LLM_NUM_PREDICT` | `512` | Max tokens to generate |
    /// | `NOTEWISE_LLM_NUM_CTX` | `4096` | Context window |
    pub fn from_env() -> Self {
        fn parse<T: FromStr>(key: &str) -> Option<T> {
            env::var(key).ok().and_then(|v| v.parse::<T>().ok())
        }

        let base = Self::default();
        let config = Self {
            base_url: env::var("NOTEWISE_LLM_URL").unwrap_or(base.base_url),
            model: env::var("NOTEWISE_LLM_MODEL").unwrap_or(base.model),
            timeout_secs: parse("NOTEWISE_LLM_TIMEOUT_SECS").unwrap_or(base.timeout_secs),
            options: GenerationOptions {
                temperature: parse("NOTEWISE_LLM_TEMPERATURE")
                    .unwrap_or(base.options.temperature),
                top_k: parse("NOTEWISE_LLM_TOP_K").unwrap_or(base.options.top_k),
                top_p: parse("NOTEWISE_LLM_TOP_P").unwrap_or(base.options.top_p),
                num_predict: parse("NOTEWISE_LLM_NUM_PREDICT")
                    .unwrap_or(base.options.num_predict),
                num_ctx: parse("NOTEWISE_LLM_NUM_CTX").unwrap_or(base.options.num_ctx),
            },
        };
        debug!(base_url = %config.base_url, model = %config.model, "LLM config loaded from env");
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parse and check the base URL.
    pub fn parsed_base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("invalid LLM base_url {:?}: {}", self.base_url, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::Config(format!(
                "LLM base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        Ok(url)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.parsed_base_url()?;

        if self.model.trim().is_empty() {
            return Err(Error::Config("LLM model cannot be empty".to_string()));
        }

        if self.timeout_secs == 0 {
            return Err(Error::Config("LLM timeout must be positive".to_string()));
        }

        let o = &self.options;
        if !(0.0..=2.0).contains(&o.temperature) {
            return Err(Error::Config(format!(
                "temperature must be between 0 and 2, got {}",
                o.temperature
            )));
        }
        if !(0.0..=1.0).contains(&o.top_p) {
            return Err(Error::Config(format!(
                "top_p must be between 0 and 1, got {}",
                o.top_p
            )));
        }
        if o.num_ctx == 0 {
            return Err(Error::Config("num_ctx must be positive".to_string()));
        }

        Ok(())
    }
}
