//! AI mentor gateway.
//!
//! One seam for everything that talks to the AI gateway: a
//! [`MentorGateway`] trait with a live OpenAI-compatible client behind
//! it, so handlers depend on the trait and tests substitute a stub.
//! Structured extraction (pulse generation, mission proposals,
//! micro-habits) uses tool calling with a forced tool choice; a reply
//! that does not carry the expected call is an explicit error, never a
//! silent fallback.

pub mod context;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::MentorConfig;

/// Errors surfaced by the AI gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Upstream rate limit (HTTP 429).
    #[error("Rate limit exceeded. Please try again in a moment.")]
    RateLimited,
    /// Upstream credit exhaustion (HTTP 402).
    #[error("AI credits depleted. Please add credits to continue.")]
    CreditsExhausted,
    /// Gateway key not configured.
    #[error("AI gateway key is not configured")]
    MissingApiKey,
    /// Any other upstream failure.
    #[error("AI gateway error: {status}")]
    Upstream { status: u16 },
    /// Response did not have the expected shape.
    #[error("Invalid AI response format: {0}")]
    InvalidResponse(String),
    /// Transport-level failure.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// A parsed tool call from the assistant.
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Parsed `function.arguments`.
    pub arguments: Value,
}

/// One chat-completion request.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// Messages in OpenAI wire format.
    pub messages: Vec<Value>,
    /// Tool definitions in OpenAI wire format; empty for plain chat.
    pub tools: Vec<Value>,
    /// Force a specific tool by name.
    pub tool_choice: Option<String>,
}

/// The assistant's reply.
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// Raw assistant message, echoed back verbatim when resuming a
    /// tool loop.
    pub message: Value,
    /// Text content, if any.
    pub content: Option<String>,
    /// Parsed tool calls, if any.
    pub tool_calls: Vec<ToolCall>,
}

impl ChatReply {
    /// Extract the arguments of a forced tool call by name.
    pub fn forced_tool_arguments(&self, name: &str) -> Result<Value, GatewayError> {
        self.tool_calls
            .iter()
            .find(|call| call.name == name)
            .map(|call| call.arguments.clone())
            .ok_or_else(|| GatewayError::InvalidResponse(format!("missing {name} tool call")))
    }
}

/// Seam between handlers and the AI gateway.
#[async_trait]
pub trait MentorGateway: Send + Sync {
    /// Run one chat completion.
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, GatewayError>;
}

/// Live OpenAI-compatible gateway client.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    config: MentorConfig,
    client: Client,
}

impl GatewayClient {
    /// Create a new gateway client.
    #[must_use]
    pub fn new(config: MentorConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Build the API URL.
    fn api_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl MentorGateway for GatewayClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, GatewayError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GatewayError::MissingApiKey)?;

        let mut body = json!({
            "model": self.config.model,
            "messages": request.messages,
        });
        if !request.tools.is_empty() {
            body["tools"] = Value::Array(request.tools.clone());
        }
        if let Some(name) = &request.tool_choice {
            body["tool_choice"] = json!({
                "type": "function",
                "function": { "name": name }
            });
        }

        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %text, "AI gateway error");
            return Err(match status.as_u16() {
                429 => GatewayError::RateLimited,
                402 => GatewayError::CreditsExhausted,
                code => GatewayError::Upstream { status: code },
            });
        }

        let data: Value = response.json().await?;
        parse_reply(&data)
    }
}

/// Parse the first choice of a chat-completion response.
fn parse_reply(data: &Value) -> Result<ChatReply, GatewayError> {
    let message = data
        .pointer("/choices/0/message")
        .cloned()
        .ok_or_else(|| GatewayError::InvalidResponse("no choices in response".to_string()))?;

    let content = message
        .get("content")
        .and_then(Value::as_str)
        .map(String::from);

    let mut tool_calls = Vec::new();
    if let Some(calls) = message.get("tool_calls").and_then(Value::as_array) {
        for call in calls {
            let id = call
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let name = call
                .pointer("/function/name")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    GatewayError::InvalidResponse("tool call without a name".to_string())
                })?
                .to_string();
            let arguments = call
                .pointer("/function/arguments")
                .and_then(Value::as_str)
                .map_or_else(
                    || Ok(Value::Object(serde_json::Map::new())),
                    serde_json::from_str,
                )
                .map_err(|e| {
                    GatewayError::InvalidResponse(format!("unparseable tool arguments: {e}"))
                })?;
            tool_calls.push(ToolCall {
                id,
                name,
                arguments,
            });
        }
    }

    Ok(ChatReply {
        message,
        content,
        tool_calls,
    })
}

/// Build a system message.
#[must_use]
pub fn system_message(text: &str) -> Value {
    json!({ "role": "system", "content": text })
}

/// Build a user message.
#[must_use]
pub fn user_message(text: &str) -> Value {
    json!({ "role": "user", "content": text })
}

/// Build a tool-result message for resuming a tool loop.
#[must_use]
pub fn tool_result_message(tool_call_id: &str, content: &str) -> Value {
    json!({
        "role": "tool",
        "tool_call_id": tool_call_id,
        "content": content
    })
}
