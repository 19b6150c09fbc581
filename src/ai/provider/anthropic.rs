//! Anthropic Messages API Provider
//!
//! System messages are lifted into the top-level `system` field; the rest of
//! the conversation is sent as alternating user/assistant turns.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{
    LlmProvider, LlmResponse, ModelParams, ProviderConfig, ResponseMetadata, ResponseTiming,
    TokenUsage,
};
use crate::constants::llm::{ANTHROPIC_API_BASE, ANTHROPIC_DEFAULT_MAX_TOKENS, ANTHROPIC_VERSION};
use crate::types::{ChatMessage, ErrorClassifier, Result, Role, SublangError};

const PROVIDER_NAME: &str = "anthropic";

/// Anthropic API Provider with secure API key handling
pub struct AnthropicProvider {
    api_key: SecretString,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl AnthropicProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key_str = config
            .api_key
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                SublangError::MissingCredentials(
                    "Anthropic API key not found. Set ANTHROPIC_API_KEY env var or provide in config"
                        .to_string(),
                )
            })?;

        let api_base = config
            .api_base
            .unwrap_or_else(|| ANTHROPIC_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SublangError::LlmApi(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key_str),
            api_base,
            model: config.model,
            client,
        })
    }

    fn build_request(messages: &[ChatMessage], params: &ModelParams) -> MessagesRequest {
        let system = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        // Consecutive same-role turns are merged; the API rejects them
        let mut turns: Vec<RequestMessage> = Vec::new();
        for message in messages.iter().filter(|m| m.role != Role::System) {
            match turns.last_mut() {
                Some(last) if last.role == message.role.as_str() => {
                    last.content.push_str("\n\n");
                    last.content.push_str(&message.content);
                }
                _ => turns.push(RequestMessage {
                    role: message.role.as_str(),
                    content: message.content.clone(),
                }),
            }
        }

        MessagesRequest {
            model: params.model.clone(),
            max_tokens: params.max_tokens.unwrap_or(ANTHROPIC_DEFAULT_MAX_TOKENS),
            system: (!system.is_empty()).then_some(system),
            messages: turns,
            temperature: params.temperature.min(1.0),
        }
    }

    fn parse_response(response: MessagesResponse) -> (String, TokenUsage) {
        let text = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");
        let usage =
            TokenUsage::from_anthropic(response.usage.input_tokens, response.usage.output_tokens);
        (text, usage)
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &ModelParams,
    ) -> Result<LlmResponse> {
        debug!(
            "Completing with Anthropic (model: {}, temperature: {})",
            params.model, params.temperature
        );

        let start_time = Instant::now();
        let request = Self::build_request(messages, params);
        let url = format!("{}/v1/messages", self.api_base);

        debug!(messages = request.messages.len(), "Sending request to Anthropic API");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                ErrorClassifier::classify(
                    &format!("Anthropic request failed: {}", e),
                    PROVIDER_NAME,
                )
            })?;

        let elapsed = start_time.elapsed();

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            let body = response.text().await.unwrap_or_default();

            let mut error = ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("Anthropic API error ({}): {}", status, body),
                PROVIDER_NAME,
            );
            if let Some(wait) = retry_after {
                error = error.retry_after(wait);
            }
            return Err(error.into());
        }

        let response_body: MessagesResponse = response.json().await.map_err(|e| {
            SublangError::LlmApi(format!("Failed to parse Anthropic response: {}", e))
        })?;
        let model = response_body
            .model
            .clone()
            .unwrap_or_else(|| params.model.clone());

        let (content, usage) = Self::parse_response(response_body);
        if content.is_empty() {
            return Err(SublangError::LlmApi(
                "No text content in Anthropic response".to_string(),
            ));
        }

        Ok(LlmResponse::with_metrics(
            content,
            usage,
            ResponseTiming::from_duration(elapsed),
            ResponseMetadata {
                model,
                provider: PROVIDER_NAME.to_string(),
            },
        ))
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/v1/models", self.api_base);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!("Anthropic API is available");
                Ok(true)
            }
            Ok(resp) => {
                warn!("Anthropic API check failed: {}", resp.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Anthropic API check failed: {}", e);
                Ok(false)
            }
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<RequestMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct RequestMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    model: Option<String>,
    content: Vec<ContentBlock>,
    usage: UsageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ModelParams {
        ModelParams {
            model: "claude-3-5-haiku-latest".to_string(),
            temperature: 0.7,
            max_tokens: None,
        }
    }

    #[test]
    fn test_system_prompt_lifted() {
        let messages = vec![
            ChatMessage::system("Be concise"),
            ChatMessage::user("Hello"),
        ];
        let request = AnthropicProvider::build_request(&messages, &params());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["system"], "Be concise");
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], ANTHROPIC_DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_consecutive_roles_merged() {
        let messages = vec![
            ChatMessage::user("first"),
            ChatMessage::user("second"),
            ChatMessage::assistant("reply"),
        ];
        let request = AnthropicProvider::build_request(&messages, &params());
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].content, "first\n\nsecond");
        assert!(request.system.is_none());
    }

    #[test]
    fn test_temperature_clamped() {
        let mut hot = params();
        hot.temperature = 1.6;
        let request = AnthropicProvider::build_request(&[ChatMessage::user("x")], &hot);
        assert!((request.temperature - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-5-haiku-20241022",
            "content": [
                {"type": "text", "text": "Hello "},
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "there"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 20, "output_tokens": 4}
        }"#;
        let parsed: MessagesResponse = serde_json::from_str(body).unwrap();
        let (text, usage) = AnthropicProvider::parse_response(parsed);
        assert_eq!(text, "Hello there");
        assert_eq!(usage.total(), 24);
    }
}
