//! OpenAI-compatible chat completions client with function-calling tools.
//!
//! Non-streaming: the orchestrator needs whole responses to dispatch tool
//! calls. Transient failures (429, 5xx, transport) are retried with
//! exponential backoff; auth failures are returned immediately.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ChatModel, ChatRequest, ChatResponse, LlmError, Role, ToolCall};

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

#[derive(Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

pub struct OpenAiChat {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl OpenAiChat {
    pub fn new(base_url: String, model: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
            base_url,
            model,
            api_key,
        }
    }

    fn role_str(role: Role) -> &'static str {
        match role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }

    fn build_messages(request: &ChatRequest) -> Vec<serde_json::Value> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(ref system) = request.system {
            messages.push(json!({"role": "system", "content": system}));
        }
        for msg in &request.messages {
            let mut m = json!({
                "role": Self::role_str(msg.role),
                "content": msg.content,
            });
            if !msg.tool_calls.is_empty() {
                m["tool_calls"] = json!(msg
                    .tool_calls
                    .iter()
                    .map(|tc| {
                        json!({
                            "id": tc.id,
                            "type": "function",
                            "function": {"name": tc.name, "arguments": tc.arguments},
                        })
                    })
                    .collect::<Vec<_>>());
            }
            if let Some(ref id) = msg.tool_call_id {
                m["tool_call_id"] = json!(id);
            }
            messages.push(m);
        }
        messages
    }

    fn build_body(&self, request: &ChatRequest) -> WireRequest {
        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(
                request
                    .tools
                    .iter()
                    .map(|t| {
                        json!({
                            "type": "function",
                            "function": {
                                "name": t.name,
                                "description": t.description,
                                "parameters": t.parameters,
                            },
                        })
                    })
                    .collect(),
            )
        };
        WireRequest {
            model: self.model.clone(),
            messages: Self::build_messages(request),
            tools,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    fn is_retryable(status: u16) -> bool {
        status == 429 || (500..=599).contains(&status)
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let url = format!(
            "{}/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let body = self.build_body(&request);

        let mut last_error = LlmError::Transport("request not attempted".into());
        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
                warn!(attempt, delay_ms = delay, "retrying model request");
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            let response = match self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    last_error = LlmError::Transport(e.to_string());
                    continue;
                }
            };

            let status = response.status().as_u16();
            if !(200..300).contains(&status) {
                let message = response.text().await.unwrap_or_default();
                if status == 401 || status == 403 {
                    return Err(LlmError::Auth(message));
                }
                last_error = LlmError::Api { status, message };
                if Self::is_retryable(status) {
                    continue;
                }
                return Err(last_error);
            }

            let wire: WireResponse = response
                .json()
                .await
                .map_err(|e| LlmError::Malformed(e.to_string()))?;
            let choice = wire
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| LlmError::Malformed("no choices in response".into()))?;

            let tool_calls = choice
                .message
                .tool_calls
                .into_iter()
                .map(|tc| ToolCall {
                    id: tc.id,
                    name: tc.function.name,
                    arguments: tc.function.arguments,
                })
                .collect::<Vec<_>>();

            debug!(
                tool_calls = tool_calls.len(),
                finish = choice.finish_reason.as_deref().unwrap_or(""),
                "model response"
            );

            return Ok(ChatResponse {
                content: choice.message.content.unwrap_or_default(),
                tool_calls,
                finish_reason: choice.finish_reason,
            });
        }

        Err(last_error)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
