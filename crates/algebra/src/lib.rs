//! Feature algebra: typed observations, per-person extraction, synonym-aware
//! set subtraction/intersection, and the cross-person uniqueness resolver.

pub mod error;
pub mod extract;
pub mod observation;
pub mod ops;
pub mod resolver;
pub mod similarity;

pub use error::{AlgebraError, Result};
pub use extract::{ExtractOptions, extract};
pub use observation::{AttrKind, AttrValue, ClothingValue, HoiValue, Observation, PoseValue};
pub use ops::{intersect, subtract};
pub use resolver::{PictureFeatures, Purified, purify, resolve, resolve_features};
pub use similarity::token_sort_ratio;
