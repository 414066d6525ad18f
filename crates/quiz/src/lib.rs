//! Question assemblers: the consumers of the feature algebra.
//!
//! Four generator families, all reading the same resolver output surface:
//! mixed per-person features, multi-image face attributes, clothing
//! groundwork, and multi-image interactions.

pub mod clothing;
pub mod error;
pub mod face;
pub mod framework;
pub mod hoi;
pub mod mixed;
pub mod sampler;

pub use error::{QuizError, Result};
pub use face::FaceFeatureGenerator;
pub use framework::{OccurrenceTracker, Question, save_questions};
pub use hoi::{HoiFeatureGenerator, HoiQuery};
pub use mixed::MixedFeatureGenerator;
pub use sampler::rng_from_seed;
