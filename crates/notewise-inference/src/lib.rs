//! # notewise-inference
//!
//! Local LLM client for notewise.
//!
//! This crate provides:
//! - An Ollama-style HTTP JSON client (`/api/generate`, `/api/tags`)
//! - Non-streaming and NDJSON-streaming generation
//! - Model presence checks before generation
//! - Environment and preferences based configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use notewise_inference::{LlmConfig, OllamaClient};
//!
//! #[tokio::main]
//! async fn main() -> notewise_core::Result<()> {
//!     let client = OllamaClient::new(LlmConfig::from_env())?;
//!     let response = client.generate("Summarize my notes").await?;
//!     println!("{}", response.response);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod ollama;
pub mod streaming;

pub use config::{GenerationOptions, LlmConfig};
pub use ollama::{GenerateResponse, ModelInfo, OllamaClient};
pub use streaming::{collect_stream, parse_ndjson_stream, GenerationStream, NdjsonDecoder};
