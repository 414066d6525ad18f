use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  #[error("Config: {0}")]
  Config(String),

  #[error("Dataset: {0}")]
  Dataset(String),

  #[error("JSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error("IO: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
