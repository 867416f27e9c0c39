//! OpenAI-compatible `/chat/completions` client

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest_middleware::ClientWithMiddleware;
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

use super::{ChatMessage, LanguageModel, ModelRequest, ModelResponse, Role, ToolCall};
use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::http;

pub struct OpenAiChatModel {
    client: ClientWithMiddleware,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout_seconds: u64,
}

impl OpenAiChatModel {
    pub fn new(config: &LlmConfig) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds.into());
        Ok(Self {
            client: http::build_client(timeout, 1)?,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            timeout_seconds: config.timeout_seconds.into(),
        })
    }

    fn request_body(&self, request: &ModelRequest) -> Value {
        let messages: Vec<Value> = request.messages.iter().map(message_to_json).collect();

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.0,
        });

        if let Some(schema) = &request.schema {
            body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": {
                    "name": schema.name,
                    "schema": schema.schema,
                    "strict": false,
                }
            });
        }

        if !request.tools.is_empty() {
            body["tools"] = Value::Array(
                request
                    .tools
                    .iter()
                    .map(|t| t.to_openai_tool_json())
                    .collect(),
            );
        }

        body
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatModel {
    #[instrument(skip(self, request), fields(model = %self.model, messages = request.messages.len(), tools = request.tools.len()))]
    async fn respond(&self, request: &ModelRequest) -> Result<ModelResponse, LlmError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let body = serde_json::to_vec(&self.request_body(request))
            .map_err(|e| LlmError::InvalidJson(e.to_string()))?;
        let started = Instant::now();

        let mut builder = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(key) = &self.api_key {
            builder = builder.header(AUTHORIZATION, format!("Bearer {key}"));
        }

        let response = builder.send().await.map_err(|e| match &e {
            reqwest_middleware::Error::Reqwest(inner) if inner.is_timeout() => {
                LlmError::Timeout(self.timeout_seconds)
            }
            _ => LlmError::Http(format!("Request failed: {e}")),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidJson(format!("Failed to parse response: {e}")))?;

        let parsed = parse_completion(&json);
        info!(
            "LLM responded in {:.3}s ({} tool calls)",
            started.elapsed().as_secs_f64(),
            parsed.tool_calls.len()
        );
        debug!("LLM content: {}", parsed.content);
        Ok(parsed)
    }
}

fn message_to_json(message: &ChatMessage) -> Value {
    match message.role {
        Role::Assistant if !message.tool_calls.is_empty() => json!({
            "role": "assistant",
            "content": if message.content.is_empty() { Value::Null } else { Value::String(message.content.clone()) },
            "tool_calls": message.tool_calls.iter().map(|call| json!({
                "id": call.id,
                "type": "function",
                "function": {
                    "name": call.name,
                    "arguments": call.arguments.to_string(),
                }
            })).collect::<Vec<_>>(),
        }),
        Role::Tool => json!({
            "role": "tool",
            "tool_call_id": message.tool_call_id,
            "content": message.content,
        }),
        role => json!({
            "role": role,
            "content": message.content,
        }),
    }
}

fn parse_completion(response_json: &Value) -> ModelResponse {
    let message = &response_json["choices"][0]["message"];
    let content = message["content"].as_str().unwrap_or_default().to_string();

    let tool_calls = message["tool_calls"]
        .as_array()
        .map(|calls| {
            calls
                .iter()
                .enumerate()
                .filter_map(|(idx, item)| {
                    let name = item["function"]["name"].as_str()?.to_string();
                    let id = item["id"]
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("tool_call_{}", idx + 1));
                    let raw_args = item["function"]["arguments"].as_str().unwrap_or("{}");
                    let arguments = serde_json::from_str::<Value>(raw_args)
                        .unwrap_or_else(|_| json!({ "raw_arguments": raw_args }));
                    Some(ToolCall {
                        id,
                        name,
                        arguments,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    ModelResponse {
        content,
        tool_calls,
    }
}
