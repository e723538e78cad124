//! Anthropic Messages API provider
//!
//! The system block is marked for ephemeral prompt caching, since the same
//! instructions are resent on every call.

use super::{provider::AiProvider, AiConfig, CompletionRequest};
use anyhow::{anyhow, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MESSAGES_PATH: &str = "/v1/messages";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl AnthropicProvider {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("API key not configured"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            api_url: config.effective_api_url().trim_end_matches('/').to_string(),
            api_key,
            model: config.effective_model().to_string(),
        })
    }
}

impl AiProvider for AnthropicProvider {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
        let body = MessagesRequest::new(&self.model, request);
        tracing::debug!(
            model = %self.model,
            max_tokens = request.max_tokens,
            "sending messages request"
        );

        let response = self
            .client
            .post(format!("{}{}", self.api_url, MESSAGES_PATH))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(anyhow!("API error {}: {}", status, body));
        }

        let message: MessagesResponse = response.json()?;
        Ok(message.into_text())
    }

    fn name(&self) -> &str {
        "Anthropic"
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: [SystemBlock<'a>; 1],
    messages: [UserMessage<'a>; 1],
}

impl<'a> MessagesRequest<'a> {
    fn new(model: &'a str, request: &'a CompletionRequest<'_>) -> Self {
        Self {
            model,
            max_tokens: request.max_tokens,
            system: [SystemBlock {
                kind: "text",
                text: request.system,
                cache_control: CacheControl { kind: "ephemeral" },
            }],
            messages: [UserMessage {
                role: "user",
                content: &request.user,
            }],
        }
    }
}

#[derive(Serialize)]
struct SystemBlock<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
    cache_control: CacheControl,
}

#[derive(Serialize)]
struct CacheControl {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

impl MessagesResponse {
    /// Only a leading text block counts; a reply that opens with anything
    /// else yields empty text.
    fn into_text(self) -> String {
        match self.content.into_iter().next() {
            Some(ContentBlock::Text { text }) => text,
            _ => String::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = CompletionRequest::new("translate", "Today's date: 2024-06-01", 512);
        let body = MessagesRequest::new("claude-sonnet-4-20250514", &request);
        let body = serde_json::to_value(body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "claude-sonnet-4-20250514",
                "max_tokens": 512,
                "system": [{
                    "type": "text",
                    "text": "translate",
                    "cache_control": {"type": "ephemeral"}
                }],
                "messages": [{"role": "user", "content": "Today's date: 2024-06-01"}]
            })
        );
    }

    #[test]
    fn test_first_text_block() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"id":"msg_1","type":"message","role":"assistant","content":[{"type":"text","text":"hello"},{"type":"text","text":"ignored"}],"stop_reason":"end_turn"}"#,
        )
        .unwrap();
        assert_eq!(response.into_text(), "hello");
    }

    #[test]
    fn test_non_text_first_block_is_empty() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"content":[{"type":"thinking","thinking":"hmm"},{"type":"text","text":"late"}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_text(), "");

        let empty: MessagesResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert_eq!(empty.into_text(), "");
    }
}
