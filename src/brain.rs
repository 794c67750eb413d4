use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::tools::Tool;
use crate::types::{ChatMessage, Role, ToolCallRequest};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Everything the model sees for one completion.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub tools: &'a [Tool],
    pub temperature: f64,
}

/// The LLM collaborator: one request in, one assistant turn out.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: ChatRequest<'_>) -> Result<ChatMessage>;
}

/// Chat Completions client for OpenAI and compatible endpoints.
pub struct OpenAiBrain {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiBrain {
    pub fn new(api_key: impl Into<String>, base_url: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url
                .unwrap_or(OPENAI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiBrain {
    async fn complete(&self, request: ChatRequest<'_>) -> Result<ChatMessage> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        debug!(
            model = request.model,
            messages = request.messages.len(),
            "calling chat completions"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body(&request))
            .send()
            .await
            .context("failed to reach the OpenAI API")?;

        let status = response.status();
        let body = response.text().await.context("failed to read OpenAI response")?;

        if !status.is_success() {
            let err_msg = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(String::from))
                .unwrap_or(body);
            warn!(%status, "OpenAI API error: {err_msg}");
            return Err(anyhow!("OpenAI API error ({status}): {err_msg}"));
        }

        let json_resp: Value =
            serde_json::from_str(&body).context("OpenAI API returned a non-JSON body")?;
        parse_reply(&json_resp)
    }
}

fn request_body(request: &ChatRequest<'_>) -> Value {
    let messages: Vec<Value> = request.messages.iter().map(wire_message).collect();
    let tools: Vec<Value> = request
        .tools
        .iter()
        .map(|t| {
            json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters_schema(),
                }
            })
        })
        .collect();

    json!({
        "model": request.model,
        "messages": messages,
        "tools": tools,
        "temperature": request.temperature,
    })
}

fn wire_message(message: &ChatMessage) -> Value {
    match message.role {
        Role::System => json!({ "role": "system", "content": message.text_content() }),
        Role::User => json!({ "role": "user", "content": message.text_content() }),
        Role::Tool => json!({
            "role": "tool",
            "tool_call_id": message.tool_call_id,
            "content": message.text_content(),
        }),
        // Null content is only accepted alongside tool calls.
        Role::Assistant if message.tool_calls.is_empty() => {
            json!({ "role": "assistant", "content": message.text_content() })
        }
        Role::Assistant => {
            let calls: Vec<Value> = message
                .tool_calls
                .iter()
                .map(|c| {
                    json!({
                        "id": c.id,
                        "type": "function",
                        "function": { "name": c.name, "arguments": c.raw_arguments },
                    })
                })
                .collect();
            json!({ "role": "assistant", "content": message.content, "tool_calls": calls })
        }
    }
}

fn parse_reply(json_resp: &Value) -> Result<ChatMessage> {
    let message = json_resp
        .pointer("/choices/0/message")
        .ok_or_else(|| anyhow!("no choices in LLM response: {json_resp}"))?;

    let content = message["content"].as_str().map(String::from);
    let tool_calls = message["tool_calls"]
        .as_array()
        .map(|calls| {
            calls
                .iter()
                .map(|c| {
                    ToolCallRequest::new(
                        c["id"].as_str().unwrap_or_default(),
                        c["function"]["name"].as_str().unwrap_or_default(),
                        raw_arguments(&c["function"]["arguments"]),
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ChatMessage::assistant(content, tool_calls))
}

/// Some compatible servers send arguments as an object instead of a string.
fn raw_arguments(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
