//! Synonym vocabularies and the body-part position taxonomy.
//!
//! Both are read-only lookup structures for the feature algebra: the synonym
//! store answers "do these two terms name the same thing", the position
//! taxonomy answers "is this body region a refinement of / disjoint from that
//! one". The store is an explicit value passed into every consumer; nothing
//! here is lazily loaded or globally mutable.

pub mod closure;
pub mod position;
pub mod store;

pub use closure::closure;
pub use store::{SynonymDict, SynonymStore, Vocabulary};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VocabError {
  #[error("unknown term: {0}")]
  UnknownTerm(String),

  #[error("JSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error("IO: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VocabError>;
