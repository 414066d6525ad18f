//! Synonymy judgment oracle.
//!
//! The engine itself never decides whether two terms mean the same thing; it
//! asks an external language model a yes/no question and parses the verdict
//! out of the free-text answer. This crate provides the provider trait, the
//! OpenAI-compatible HTTP provider, the answer parser, and retry plumbing
//! with a manual "retry now" escape hatch.

mod chat;
mod decision;
mod provider;
mod retry;

pub use chat::ChatCompletionsProvider;
pub use decision::Decision;
pub use provider::{OracleProvider, Result};
pub use retry::{RetryConfig, RetrySignal, judge_with_retry};

/// Errors from oracle calls.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
  #[error("HTTP: {0}")]
  Http(#[from] reqwest::Error),
  #[error("request timed out after {0} seconds")]
  Timeout(u64),
  #[error("endpoint returned status {status}: {message}")]
  Api { status: u16, message: String },
  #[error("response contained no choices")]
  EmptyResponse,
  #[error("provider is not configured")]
  NotConfigured,
}

impl OracleError {
  /// Transient failures are worth retrying; anything else surfaces
  /// immediately.
  pub fn is_transient(&self) -> bool {
    match self {
      OracleError::Timeout(_) => true,
      OracleError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
      OracleError::Api { status, .. } => matches!(status, 429 | 502 | 503 | 504),
      OracleError::EmptyResponse | OracleError::NotConfigured => false,
    }
  }
}
