//! Oracle provider trait.

use async_trait::async_trait;
use dyn_clone::DynClone;

use crate::OracleError;

pub type Result<T> = std::result::Result<T, OracleError>;

/// A backend that can answer a natural-language yes/no question with free
/// text. Implementations must be cheap to clone; one instance is shared
/// across the population worker pool.
#[async_trait]
pub trait OracleProvider: Send + Sync + DynClone {
  /// Name of this provider, for logging.
  fn name(&self) -> &str;

  /// Whether the provider is configured well enough to try a call.
  fn is_available(&self) -> bool;

  /// Ask the question and return the raw response text. Decision parsing
  /// is the caller's job, see [`crate::Decision`].
  async fn judge(&self, question: &str) -> Result<String>;
}

dyn_clone::clone_trait_object!(OracleProvider);
