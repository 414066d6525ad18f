//! Cross-person uniqueness resolution.
//!
//! For every person in a picture: which observations distinguish them from
//! everyone else (fold of subtraction over the other persons), and which are
//! common to all (fold of intersection). Both go through a purification step
//! before the question assemblers see them.

use personbench_core::Picture;
use vocab::SynonymStore;

use crate::error::Result;
use crate::extract::{ExtractOptions, extract};
use crate::observation::{AttrKind, Observation};
use crate::ops::{intersect, subtract};

/// Purified observation lists for one feature set.
#[derive(Debug, Clone, Default)]
pub struct Purified {
  /// Everything that may serve as a question answer.
  pub answers: Vec<Observation>,
  /// The subset usable as a selection condition: landmark sub-boxes point
  /// at an answer region, they do not describe a person.
  pub conditions: Vec<Observation>,
}

/// Resolver output for one picture, indexed like `picture.persons`.
#[derive(Debug, Clone, Default)]
pub struct PictureFeatures {
  pub unique: Vec<Purified>,
  /// Observations every person shares, purified, bounding boxes excluded
  /// by construction.
  pub shared: Vec<Observation>,
}

/// Drop unknown-valued observations and, for the condition side, landmark
/// sub-boxes (only the face/body full boxes describe a person). With
/// `exclude_facial`, facial slots are dropped from the answers as well.
pub fn purify(features: &[Observation], exclude_facial: bool) -> Purified {
  let mut answers: Vec<Observation> = features.iter().filter(|o| !o.is_unknown()).cloned().collect();
  if exclude_facial {
    answers.retain(|o| o.kind() != AttrKind::Facial);
    answers.retain(|o| o.kind() != AttrKind::Bbox || matches!(o.name.as_str(), "face" | "body"));
  }
  let conditions = answers
    .iter()
    .filter(|o| o.kind() != AttrKind::Bbox || matches!(o.name.as_str(), "face" | "body"))
    .cloned()
    .collect();
  Purified { answers, conditions }
}

/// Extract every person and resolve unique/shared feature sets.
///
/// A data-integrity error aborts the whole picture: the caller is expected
/// to log and skip it, not to resume with partial feature sets.
pub fn resolve(picture: &Picture, store: &SynonymStore, opts: ExtractOptions) -> Result<PictureFeatures> {
  let features: Vec<Vec<Observation>> = picture.persons.iter().map(|p| extract(p, opts)).collect();
  resolve_features(&features, store)
}

/// Resolver core over pre-extracted feature lists. Split out so tests and
/// callers that already hold feature lists can drive it directly.
pub fn resolve_features(features: &[Vec<Observation>], store: &SynonymStore) -> Result<PictureFeatures> {
  let mut unique = Vec::with_capacity(features.len());
  let mut shared: Option<Vec<Observation>> = None;

  for (i, own) in features.iter().enumerate() {
    let mut remaining = own.clone();
    for (j, other) in features.iter().enumerate() {
      if i != j {
        remaining = subtract(&remaining, other, store)?;
      }
    }
    unique.push(purify(&remaining, false));

    shared = Some(match shared {
      None => own.iter().filter(|o| o.kind() != AttrKind::Bbox).cloned().collect(),
      Some(acc) => intersect(&acc, own, store)?,
    });
  }

  let shared = purify(&shared.unwrap_or_default(), false).answers;
  Ok(PictureFeatures { unique, shared })
}
