use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuizError {
  #[error("Algebra: {0}")]
  Algebra(#[from] algebra::AlgebraError),

  #[error("JSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error("IO: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, QuizError>;
