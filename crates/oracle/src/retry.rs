//! Retry with exponential backoff and a manual "retry now" signal.
//!
//! Oracle runs are long and the backing server gets restarted or moved mid
//! run; the operator can fire the retry signal to preempt a long backoff
//! wait instead of sitting it out.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::provider::{OracleProvider, Result};

#[derive(Debug, Clone)]
pub struct RetryConfig {
  /// Maximum retry attempts after the initial call.
  pub max_retries: u32,
  /// Initial backoff, doubled per failed attempt.
  pub base_delay: Duration,
  /// Backoff cap.
  pub max_delay: Duration,
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      max_retries: 7,
      base_delay: Duration::from_secs(2),
      max_delay: Duration::from_secs(600),
    }
  }
}

impl RetryConfig {
  /// Backoff before retry number `attempt + 1`: `base * 2^attempt`, capped.
  pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
    let exp = self.base_delay.as_secs_f64() * 2f64.powi(attempt as i32);
    Duration::from_secs_f64(exp.min(self.max_delay.as_secs_f64()))
  }
}

/// Out-of-band retry trigger shared between the population run and whatever
/// operator surface wants to poke it.
#[derive(Debug, Clone, Default)]
pub struct RetrySignal {
  notify: Arc<Notify>,
}

impl RetrySignal {
  pub fn new() -> Self {
    Self::default()
  }

  /// Preempt any backoff wait currently in progress.
  pub fn trigger(&self) {
    self.notify.notify_waiters();
  }

  async fn wait(&self) {
    self.notify.notified().await;
  }
}

/// Ask the oracle, retrying transient failures with exponential backoff.
/// The retry signal cuts a backoff wait short; non-transient errors and
/// exhausted retries surface the original error to the caller.
pub async fn judge_with_retry(
  provider: &dyn OracleProvider,
  question: &str,
  config: &RetryConfig,
  signal: &RetrySignal,
) -> Result<String> {
  let mut attempt = 0u32;
  loop {
    match provider.judge(question).await {
      Ok(answer) => {
        if attempt > 0 {
          info!(attempt, "Oracle call succeeded after retry");
        }
        return Ok(answer);
      }
      Err(e) if e.is_transient() && attempt < config.max_retries => {
        let delay = config.delay_for_attempt(attempt);
        warn!(
          attempt = attempt + 1,
          max_retries = config.max_retries,
          delay_secs = delay.as_secs(),
          err = %e,
          "Transient oracle failure, backing off (trigger retry signal to skip the wait)"
        );
        tokio::select! {
          _ = sleep(delay) => {}
          _ = signal.wait() => {
            debug!("Manual retry signal received, retrying immediately");
          }
        }
        attempt += 1;
      }
      Err(e) => {
        if attempt >= config.max_retries {
          warn!(max_retries = config.max_retries, err = %e, "Oracle retries exhausted");
        }
        return Err(e);
      }
    }
  }
}
