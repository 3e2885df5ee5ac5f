//! Conjure Generator — turns a request plus ambient context into a prompt,
//! sends it to the model, and extracts the command from the reply.

mod anthropic;
mod prompt;

pub use anthropic::AnthropicGenerator;
pub use prompt::{build_prompt, Prompt};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} — {message}")]
    Api { status: u16, message: String },

    #[error("Generator not configured: {0}")]
    NotConfigured(String),
}

/// What one generation attempt produced.
///
/// `Empty` is not an error: the upstream call succeeded but yielded no
/// usable text (whitespace-only or non-text content).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// A non-empty command, leading/trailing whitespace already trimmed.
    Command(String),
    /// The model replied with nothing actionable.
    Empty,
}

/// Configuration for the command generator.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct GeneratorConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_timeout() -> u64 {
    30_000
}

fn default_max_tokens() -> u32 {
    256
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            endpoint: None,
            timeout_ms: default_timeout(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Trait the pipeline generates through; tests substitute a fake.
#[async_trait]
pub trait CommandGenerator: Send + Sync {
    /// Generator name (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Produce a command for the prompt, or report that the model had
    /// nothing to say.
    async fn generate(&self, prompt: &Prompt) -> Result<Generation, GeneratorError>;
}
