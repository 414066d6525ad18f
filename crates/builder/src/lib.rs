//! Synonym-dictionary population: enumerate candidate term pairs over the
//! dataset, adjudicate each pair through the oracle (with local prefilters),
//! and checkpoint the growing dictionary so interrupted runs resume where
//! they stopped.

pub mod error;
pub mod pairs;
pub mod pipeline;
pub mod prompts;

pub use error::{BuilderError, Result};
pub use pairs::{CandidatePair, TermKind, collect_hoi_terms, enumerate_pairs};
pub use pipeline::{PopulateConfig, PopulateStats, populate};
pub use prompts::{prefilter, question_for};
