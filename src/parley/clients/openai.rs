//! Client for servers that implement the OpenAI chat-completions API.
//!
//! Built on the `openai-rust2` SDK pointed at a custom base URL, so it works against OpenAI
//! itself as well as local servers that mirror the API, such as the `/v1` layer of Ollama
//! or llama.cpp. Requests go to `{base_url}/v1/chat/completions` through the same
//! timeout-bounded `reqwest::Client` the other adapters use.
//!
//! ```rust,no_run
//! use parley::clients::openai::OpenAICompatibleClient;
//! use parley::config::EndpointConfig;
//!
//! let client = OpenAICompatibleClient::new(EndpointConfig {
//!     base_url: "https://api.openai.com".into(),
//!     api_key: std::env::var("OPEN_AI_SECRET").ok(),
//!     ..EndpointConfig::default()
//! })
//! .unwrap();
//! ```

use crate::parley::clients::common::{build_http_client, map_reqwest_error_ref};
use crate::parley::config::EndpointConfig;
use crate::parley::endpoint::{EndpointError, Message, ModelEndpoint, Role};
use async_trait::async_trait;
use openai_rust::chat;
use openai_rust2 as openai_rust;
use std::error::Error;

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

fn chat_messages(system_prompt: &str, messages: &[Message]) -> Vec<chat::Message> {
    let mut out = Vec::with_capacity(messages.len() + 1);
    if !system_prompt.is_empty() {
        out.push(chat::Message {
            role: Role::System.as_str().to_owned(),
            content: system_prompt.to_string(),
        });
    }
    out.extend(messages.iter().map(|m| chat::Message {
        role: m.role.as_str().to_owned(),
        content: m.content.clone(),
    }));
    out
}

/// Classify an SDK failure.
///
/// Transport and decode failures surface as the `reqwest` or `serde_json` error the SDK
/// wrapped. Anything else is the server rejecting the request, which the SDK reports with
/// the response body as its message.
fn map_sdk_error(err: Box<dyn Error + Send + Sync>) -> EndpointError {
    if let Some(transport) = err.downcast_ref::<reqwest::Error>() {
        return map_reqwest_error_ref(transport);
    }
    if err.downcast_ref::<serde_json::Error>().is_some() {
        return EndpointError::MalformedResponse(err.to_string());
    }
    EndpointError::Request(err.to_string())
}

/// [`ModelEndpoint`] for OpenAI-style chat-completions servers.
pub struct OpenAICompatibleClient {
    client: openai_rust::Client,
    config: EndpointConfig,
}

impl OpenAICompatibleClient {
    /// Create a client for `config.base_url`. A missing `api_key` sends an empty token,
    /// which local servers ignore.
    pub fn new(config: EndpointConfig) -> Result<Self, EndpointError> {
        let http_client = build_http_client(config.timeout_secs)?;
        let client = openai_rust::Client::new_with_client_and_base_url(
            config.api_key.as_deref().unwrap_or_default(),
            http_client,
            config.base_url.trim_end_matches('/'),
        );
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }
}

#[async_trait]
impl ModelEndpoint for OpenAICompatibleClient {
    async fn generate(
        &self,
        model: &str,
        messages: &[Message],
        system_prompt: &str,
    ) -> Result<String, EndpointError> {
        let formatted = chat_messages(system_prompt, messages);
        log::debug!(
            "parley::clients::openai: chat model={} messages={}",
            model,
            formatted.len()
        );
        let mut arguments = chat::ChatArguments::new(model, formatted);
        arguments.temperature = Some(self.config.temperature);
        arguments.max_tokens = Some(self.config.num_predict);

        let response = self
            .client
            .create_chat(arguments, Some(CHAT_COMPLETIONS_PATH.to_string()))
            .await
            .map_err(|err| {
                let err: Box<dyn Error + Send + Sync> = err.into();
                map_sdk_error(err)
            })?;

        response
            .choices
            .first()
            .map(|choice| choice.message.content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                EndpointError::MalformedResponse("response contained no message content".into())
            })
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_leads_the_message_list() {
        let messages = vec![Message::new(Role::User, "Bot 1: hi")];
        let out = chat_messages("Be brief.", &messages);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].role, "system");
        assert_eq!(out[1].role, "user");
        assert_eq!(out[1].content, "Bot 1: hi");
    }

    #[test]
    fn empty_system_prompt_is_omitted() {
        let messages = vec![Message::new(Role::Assistant, "Bot 1: hi")];
        let out = chat_messages("", &messages);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].role, "assistant");
    }

    #[test]
    fn unknown_sdk_failure_is_a_request_error() {
        let err: Box<dyn Error + Send + Sync> = "model not loaded".into();
        assert_eq!(
            map_sdk_error(err),
            EndpointError::Request("model not loaded".into())
        );
    }
}
