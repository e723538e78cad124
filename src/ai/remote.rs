//! Remote AI provider implementation
//!
//! Implements the AiProvider trait for OpenAI-compatible HTTP APIs.
//! Works with OpenAI, Groq, Together AI, local vLLM, etc.

use super::{provider::AiProvider, AiConfig, CompletionRequest};
use anyhow::{anyhow, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Remote AI provider using OpenAI-compatible API
pub struct RemoteProvider {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl RemoteProvider {
    /// Create a new remote provider from configuration
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

    /// Build the full API URL
    fn full_url(&self) -> String {
        format!("{}{}", self.api_url, CHAT_COMPLETIONS_PATH)
    }
}

impl AiProvider for RemoteProvider {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
        let body = ChatRequest::new(&self.model, request);
        tracing::debug!(
            model = %self.model,
            max_tokens = request.max_tokens,
            "sending chat completion"
        );

        let response = self
            .client
            .post(self.full_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(anyhow!("API error {}: {}", status, body));
        }

        let completion: ChatResponse = response.json()?;
        Ok(completion.into_text())
    }

    fn name(&self) -> &str {
        "OpenAI-compatible API"
    }
}

// OpenAI API request/response types

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [ChatMessage<'a>; 2],
}

impl<'a> ChatRequest<'a> {
    fn new(model: &'a str, request: &'a CompletionRequest<'_>) -> Self {
        Self {
            model,
            max_tokens: request.max_tokens,
            messages: [
                ChatMessage {
                    role: "system",
                    content: request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

impl ChatResponse {
    fn into_text(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = CompletionRequest::new("be brief", "hello", 512);
        let body = serde_json::to_value(ChatRequest::new("gpt-4o-mini", &request)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "gpt-4o-mini",
                "max_tokens": 512,
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hello"}
                ]
            })
        );
    }

    #[test]
    fn test_response_text() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"{\"table\":\"contacts\"}"},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_text(), r#"{"table":"contacts"}"#);

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(empty.into_text(), "");
    }

    #[test]
    fn test_new_requires_key() {
        assert!(RemoteProvider::new(&AiConfig::default()).is_err());
    }
}
