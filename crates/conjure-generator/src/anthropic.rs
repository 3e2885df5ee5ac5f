use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{CommandGenerator, Generation, GeneratorConfig, GeneratorError, Prompt};

const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";
const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";

/// Command generator backed by the Anthropic Messages API.
pub struct AnthropicGenerator {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    timeout: std::time::Duration,
    max_tokens: u32,
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    system: String,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl AnthropicGenerator {
    pub fn new(config: &GeneratorConfig) -> Result<Self, GeneratorError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| GeneratorError::NotConfigured("generator: api_key required".into()))?;

        Ok(Self {
            client: Client::new(),
            api_key,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            endpoint: config
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            timeout: std::time::Duration::from_millis(config.timeout_ms),
            max_tokens: config.max_tokens,
        })
    }
}

/// First text-typed content block, trimmed. Internal markdown is left as the
/// model produced it rather than second-guessed.
fn extract_command(blocks: &[ContentBlock]) -> Generation {
    let text = blocks
        .iter()
        .find(|b| b.kind == "text")
        .map(|b| b.text.trim())
        .unwrap_or("");

    if text.is_empty() {
        Generation::Empty
    } else {
        Generation::Command(text.to_string())
    }
}

#[async_trait]
impl CommandGenerator for AnthropicGenerator {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(&self, prompt: &Prompt) -> Result<Generation, GeneratorError> {
        debug!(model = %self.model, "Requesting command generation");

        let body = MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.user.clone(),
            }],
            system: prompt.system.clone(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let api_response: MessagesResponse = response.json().await?;
        let generation = extract_command(&api_response.content);
        if generation == Generation::Empty {
            warn!("Model replied with no usable text");
        }

        Ok(generation)
    }
}
