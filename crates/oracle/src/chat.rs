//! OpenAI-compatible chat-completions provider.
//!
//! The judgment model sits behind a local vLLM-style server exposing
//! `/chat/completions`; anything speaking that dialect works.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::provider::{OracleProvider, Result};
use crate::OracleError;

#[derive(Debug, Clone)]
pub struct ChatCompletionsProvider {
  client: reqwest::Client,
  base_url: String,
  model: String,
  api_key: String,
  timeout_secs: u64,
}

impl ChatCompletionsProvider {
  pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>, timeout_secs: u64) -> Self {
    Self {
      client: reqwest::Client::new(),
      base_url: base_url.into(),
      model: model.into(),
      api_key: api_key.into(),
      timeout_secs,
    }
  }
}

// Wire types for the chat completions dialect.

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
  model: &'a str,
  messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
  role: &'a str,
  content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
  #[serde(default)]
  choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
  message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
  #[serde(default)]
  content: String,
}

#[async_trait]
impl OracleProvider for ChatCompletionsProvider {
  fn name(&self) -> &str {
    "chat-completions"
  }

  fn is_available(&self) -> bool {
    !self.base_url.is_empty() && !self.model.is_empty()
  }

  async fn judge(&self, question: &str) -> Result<String> {
    if !self.is_available() {
      return Err(OracleError::NotConfigured);
    }

    let request = ChatRequest {
      model: &self.model,
      messages: vec![ChatMessage {
        role: "user",
        content: question,
      }],
    };
    trace!(model = %self.model, "Sending oracle question");

    let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
    let response = self
      .client
      .post(&url)
      .bearer_auth(&self.api_key)
      .timeout(Duration::from_secs(self.timeout_secs))
      .json(&request)
      .send()
      .await
      .map_err(|e| {
        if e.is_timeout() {
          OracleError::Timeout(self.timeout_secs)
        } else {
          OracleError::Http(e)
        }
      })?;

    let status = response.status();
    if !status.is_success() {
      let message = response.text().await.unwrap_or_default();
      return Err(OracleError::Api {
        status: status.as_u16(),
        message,
      });
    }

    let parsed: ChatResponse = response.json().await?;
    let answer = parsed
      .choices
      .into_iter()
      .next()
      .map(|c| c.message.content)
      .ok_or(OracleError::EmptyResponse)?;
    debug!(chars = answer.len(), "Oracle answered");
    Ok(answer)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_availability() {
    let provider = ChatCompletionsProvider::new("http://localhost:2336/v1", "qwen2.5-vl-72b", "NONONO", 1000);
    assert!(provider.is_available());

    let unconfigured = ChatCompletionsProvider::new("", "", "", 10);
    assert!(!unconfigured.is_available());
  }

  #[test]
  fn test_response_parsing() {
    let raw = r#"{"choices": [{"message": {"role": "assistant", "content": "yes"}}]}"#;
    let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
    assert_eq!(parsed.choices[0].message.content, "yes");

    let empty: ChatResponse = serde_json::from_str("{}").unwrap();
    assert!(empty.choices.is_empty());
  }
}
