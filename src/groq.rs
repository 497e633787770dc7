use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

pub const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";
const TEMPERATURE: f64 = 0.2;
const MAX_TOKENS: u32 = 1024;

#[derive(Serialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

#[derive(Serialize)]
struct RequestMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Serialize)]
struct CompletionRequest {
    model: &'static str,
    messages: Vec<RequestMessage>,
    temperature: f64,
    max_tokens: u32,
}

impl CompletionRequest {
    /// Only the new prompt is sent; earlier turns stay local to the UI.
    fn for_prompt(prompt: &str) -> Self {
        Self {
            model: MODEL,
            messages: vec![RequestMessage {
                role: "user",
                content: vec![ContentPart {
                    kind: "text",
                    text: prompt.to_string(),
                }],
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroqError {
    #[error("API Error: {status} {body}")]
    Api { status: u16, body: String },
    #[error("{0}")]
    Network(String),
}

/// Text pulled out of a successful response.
///
/// `Fallback` carries the raw payload when no reply text could be located;
/// it is shown to the user as-is rather than treated as a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Extracted(String),
    Fallback(String),
}

impl ParseOutcome {
    pub fn into_text(self) -> String {
        match self {
            ParseOutcome::Extracted(text) | ParseOutcome::Fallback(text) => text,
        }
    }
}

#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    endpoint: String,
}

impl GroqClient {
    pub fn new() -> Self {
        Self::with_endpoint(GROQ_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn complete(&self, api_key: &str, prompt: &str) -> Result<ParseOutcome, GroqError> {
        let request = CompletionRequest::for_prompt(prompt);
        debug!(endpoint = %self.endpoint, model = MODEL, chars = prompt.chars().count(), "sending completion request");

        let response = self.client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| GroqError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| GroqError::Network(e.to_string()))?;
            warn!(status, "completion request rejected");
            return Err(GroqError::Api { status, body });
        }

        let body = response
            .text()
            .await
            .map_err(|e| GroqError::Network(e.to_string()))?;
        Ok(parse_reply_body(&body))
    }
}

impl Default for GroqClient {
    fn default() -> Self {
        Self::new()
    }
}

pub fn parse_reply_body(body: &str) -> ParseOutcome {
    match serde_json::from_str::<Value>(body) {
        Ok(payload) => extract_reply(&payload),
        Err(e) => {
            debug!(error = %e, "success body is not JSON, showing it raw");
            ParseOutcome::Fallback(body.to_string())
        }
    }
}

/// Locate the assistant text in a chat-completion payload.
///
/// Tries `choices[0].message.content`, then `choices[0].content`, then
/// `choices[0].text`, skipping null/false/0/"" the way a loose JSON consumer
/// would. Content arrays are flattened one fragment per line; a null fragment
/// makes the whole payload the fallback.
pub fn extract_reply(payload: &Value) -> ParseOutcome {
    let choice = payload.get("choices").and_then(|c| c.get(0));

    let content = choice
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .filter(|v| truthy(v))
        .or_else(|| choice.and_then(|c| c.get("content")).filter(|v| truthy(v)))
        .or_else(|| choice.and_then(|c| c.get("text")).filter(|v| truthy(v)));

    match content {
        None => {
            let raw = choice.filter(|c| truthy(c)).unwrap_or(payload);
            ParseOutcome::Fallback(raw.to_string())
        }
        Some(Value::String(text)) => ParseOutcome::Extracted(text.clone()),
        Some(Value::Array(parts)) if parts.iter().any(Value::is_null) => {
            ParseOutcome::Fallback(payload.to_string())
        }
        Some(Value::Array(parts)) => {
            let lines: Vec<String> = parts
                .iter()
                .map(|part| match part {
                    Value::String(s) => s.clone(),
                    other => text_or_serialized(other),
                })
                .collect();
            ParseOutcome::Extracted(lines.join("\n"))
        }
        Some(other) => ParseOutcome::Extracted(text_or_serialized(other)),
    }
}

fn text_or_serialized(value: &Value) -> String {
    match value.get("text").filter(|t| truthy(t)) {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => value.to_string(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
