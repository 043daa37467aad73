// HTTP client for the Anthropic Messages API

use std::time::Duration;

use serde_json::Value;

// ============================================
// Configuration Constants
// ============================================

/// Timeout for a single classification or extraction call. There is no
/// retry - callers fall back to deterministic paths on any failure, so
/// this bounds the worst-case added latency per scan.
const REQUEST_TIMEOUT_SECS: u64 = 30;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

// ============================================
// Errors
// ============================================

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("response missing expected tool_use block '{0}'")]
    MissingToolUse(String),
}

// ============================================
// Client Implementation
// ============================================

/// Thin Messages-API client. Every call forces a tool invocation so the
/// model's output is schema-constrained JSON rather than free text.
#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn new(api_key: String, model: String) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one message and return the forced tool's input object.
    ///
    /// `tool` is the full tool definition (name, description,
    /// input_schema); `tool_name` must match its name field. Transport
    /// errors, non-2xx statuses, and responses without the expected
    /// tool_use block are all surfaced as `LlmError` - callers treat
    /// every variant the same way (fall back, never retry).
    pub async fn tool_call(
        &self,
        system: Option<&str>,
        user_content: &str,
        tool: &Value,
        tool_name: &str,
    ) -> Result<Value, LlmError> {
        let mut body = serde_json::json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "tools": [tool],
            "tool_choice": {"type": "tool", "name": tool_name},
            "messages": [{"role": "user", "content": user_content}],
        });
        if let Some(system) = system {
            body["system"] = Value::String(system.to_string());
        }

        let resp = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = resp.json().await?;

        // The response content is a list of blocks; with a forced
        // tool_choice exactly one should be our tool_use block.
        if let Some(blocks) = json["content"].as_array() {
            for block in blocks {
                if block["type"].as_str() == Some("tool_use")
                    && block["name"].as_str() == Some(tool_name)
                {
                    return Ok(block["input"].clone());
                }
            }
        }

        Err(LlmError::MissingToolUse(tool_name.to_string()))
    }
}
