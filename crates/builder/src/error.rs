use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuilderError {
  #[error("Vocab: {0}")]
  Vocab(#[from] vocab::VocabError),
}

pub type Result<T> = std::result::Result<T, BuilderError>;
