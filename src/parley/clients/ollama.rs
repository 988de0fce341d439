//! Client for a local [Ollama](https://ollama.com) server.
//!
//! Uses the native `POST /api/generate` endpoint with streaming disabled. That endpoint
//! takes a single prompt string, so the system prompt and the shared context are
//! flattened into labelled lines:
//!
//! ```text
//! System: <system prompt>
//! User: Bot 1: Today's topic for discussion is: ...
//! Assistant: Bot 2: Great topic! I'm ready to discuss.
//! Assistant:
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use parley::clients::ollama::OllamaClient;
//! use parley::config::EndpointConfig;
//!
//! # async fn demo() -> Result<(), parley::EndpointError> {
//! let client = OllamaClient::new(EndpointConfig::default())?;
//! if client.check_connection().await {
//!     println!("models: {:?}", client.available_models().await?);
//! }
//! # Ok(())
//! # }
//! ```

use crate::parley::clients::common::{build_http_client, join_url, map_reqwest_error, read_json};
use crate::parley::config::EndpointConfig;
use crate::parley::endpoint::{EndpointError, Message, ModelEndpoint, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CONNECTION_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

/// Flatten a system prompt and chat messages into one Ollama prompt.
///
/// An empty `system_prompt` contributes no line. The result always ends with
/// `"\nAssistant:"` so the model continues as the current agent.
///
/// ```
/// use parley::clients::ollama::flatten_prompt;
/// use parley::{Message, Role};
///
/// let prompt = flatten_prompt("Be brief.", &[Message::new(Role::User, "Bot 1: hi")]);
/// assert_eq!(prompt, "System: Be brief.\nUser: Bot 1: hi\nAssistant:");
/// ```
pub fn flatten_prompt(system_prompt: &str, messages: &[Message]) -> String {
    let mut lines = Vec::with_capacity(messages.len() + 1);
    if !system_prompt.is_empty() {
        lines.push(format!("{}: {}", Role::System.label(), system_prompt));
    }
    for message in messages {
        lines.push(format!("{}: {}", message.role.label(), message.content));
    }
    let mut prompt = lines.join("\n");
    prompt.push_str("\nAssistant:");
    prompt
}

/// [`ModelEndpoint`] backed by Ollama's native API.
pub struct OllamaClient {
    client: reqwest::Client,
    config: EndpointConfig,
}

impl OllamaClient {
    /// Create a client for `config.base_url` with the configured per-call timeout.
    pub fn new(config: EndpointConfig) -> Result<Self, EndpointError> {
        let client = build_http_client(config.timeout_secs)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    async fn tags(&self) -> Result<TagsResponse, EndpointError> {
        let response = self
            .client
            .get(join_url(&self.config.base_url, "/api/tags"))
            .timeout(CONNECTION_CHECK_TIMEOUT)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }

    /// Whether the server answers `GET /api/tags` with a success status.
    pub async fn check_connection(&self) -> bool {
        match self.tags().await {
            Ok(_) => true,
            Err(err) => {
                log::debug!(
                    "parley::clients::ollama: {} is not reachable: {}",
                    self.config.base_url,
                    err
                );
                false
            }
        }
    }

    /// Names of the locally installed models, sorted.
    pub async fn available_models(&self) -> Result<Vec<String>, EndpointError> {
        let mut names: Vec<String> = self
            .tags()
            .await?
            .models
            .into_iter()
            .map(|tag| tag.name)
            .collect();
        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl ModelEndpoint for OllamaClient {
    async fn generate(
        &self,
        model: &str,
        messages: &[Message],
        system_prompt: &str,
    ) -> Result<String, EndpointError> {
        let request = GenerateRequest {
            model,
            prompt: flatten_prompt(system_prompt, messages),
            stream: false,
            options: GenerateOptions {
                temperature: self.config.temperature,
                num_predict: self.config.num_predict,
            },
        };

        log::debug!(
            "parley::clients::ollama: generate model={} prompt_chars={}",
            model,
            request.prompt.len()
        );
        let response = self
            .client
            .post(join_url(&self.config.base_url, "/api/generate"))
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let body: GenerateResponse = read_json(response).await?;
        Ok(body.response.trim().to_string())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_skips_empty_system_prompt() {
        let messages = vec![
            Message::new(Role::Assistant, "Bot 1: opening"),
            Message::new(Role::User, "Bot 2: reply"),
        ];
        assert_eq!(
            flatten_prompt("", &messages),
            "Assistant: Bot 1: opening\nUser: Bot 2: reply\nAssistant:"
        );
    }

    #[test]
    fn flatten_with_no_messages_still_prompts_assistant() {
        assert_eq!(flatten_prompt("Be kind.", &[]), "System: Be kind.\nAssistant:");
    }

    #[test]
    fn request_body_shape() {
        let request = GenerateRequest {
            model: "llama3.2",
            prompt: "User: hi\nAssistant:".into(),
            stream: false,
            options: GenerateOptions {
                temperature: 0.5,
                num_predict: 150,
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "llama3.2");
        assert_eq!(value["stream"], false);
        assert_eq!(value["options"]["num_predict"], 150);
    }

    #[test]
    fn tags_without_models_field_is_empty() {
        let tags: TagsResponse = serde_json::from_str("{}").unwrap();
        assert!(tags.models.is_empty());
    }
}
