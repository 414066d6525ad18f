//! Question records and shared generator plumbing.
//!
//! Each generator family emits flat JSON records built directly from
//! attribute observations. A template attempt that does not apply to a
//! picture returns `None` — "no valid candidate" is an ordinary outcome,
//! not an error.

use std::collections::HashMap;
use std::path::Path;

use algebra::Observation;
use serde::Serialize;
use tracing::info;

use crate::error::Result;

/// One benchmark question. The `type` tag and field names are the wire
/// format consumed by the rendering/evaluation side.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Question {
  /// Point at a region given a distinguishing condition.
  Grounding {
    condition: Observation,
    question: Observation,
    image: String,
  },
  /// Fill in the masked attribute of the person matching the condition.
  Blank {
    condition: Observation,
    question: Observation,
    image: String,
    can_mutate_hand_to_false: bool,
  },
  /// Pick the true statement about the person matching the condition.
  Choice {
    condition: Observation,
    image: String,
    true_answer: Observation,
    false_answers: Vec<Observation>,
  },
  /// A verification question that grounds if it verifies as true.
  TfGrounding {
    condition_1: Observation,
    condition_2: Observation,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer: Option<Observation>,
    /// Placeholder answer slot for the deliberately false variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    fake_answer: Option<Observation>,
    image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    can_mutate_hand_to_false: Option<bool>,
  },
  /// A verification question that fills a blank if it verifies as true.
  TfBlank {
    condition_1: Observation,
    condition_2: Observation,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer: Option<Observation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fake_answer: Option<Observation>,
    image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    can_mutate_hand_to_false: Option<bool>,
  },
  /// Ground an interaction given a non-interaction condition.
  OpenGrounding {
    condition: Observation,
    answer: Observation,
    image: String,
  },
  /// Pick the feature every depicted person shares.
  CommonChoice {
    true_answer: Observation,
    false_answers: Vec<Observation>,
    image: String,
  },
  /// Four images bucketed by how many of three facial attributes hold.
  MultiFaceFeature {
    combine: Vec<String>,
    fullfit: String,
    duo: String,
    duo_admit: Vec<String>,
    solo: String,
    solo_admit: Vec<String>,
    none: String,
  },
  /// Cross-image interaction comparison: same object elsewhere with a
  /// different position, a different object in the same role, plus one
  /// extra distractor of either kind.
  MultiImageHoi {
    object: String,
    hoi: Vec<(String, String)>,
    full: String,
    diff_object: String,
    object_diff: Vec<String>,
    diff_position: String,
    position_diff: Vec<String>,
    extra_type: String,
    extra_diff: Vec<String>,
    diff_extra: String,
  },
}

/// Serialize questions to a JSON file.
pub fn save_questions(questions: &[Question], path: &Path) -> Result<()> {
  let text = serde_json::to_string_pretty(questions)?;
  std::fs::write(path, text)?;
  info!(count = questions.len(), path = %path.display(), "Saved questions");
  Ok(())
}

/// How often each picture (by index into the filtered set) has been used in
/// an emitted question. Generators prefer rarely used pictures to spread
/// coverage across the dataset.
#[derive(Debug, Default)]
pub struct OccurrenceTracker {
  counts: HashMap<usize, usize>,
}

impl OccurrenceTracker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, picture: usize) -> usize {
    self.counts.get(&picture).copied().unwrap_or(0)
  }

  pub fn bump(&mut self, picture: usize) {
    *self.counts.entry(picture).or_insert(0) += 1;
  }

  /// Sort picture indices by ascending usage, stable for equal counts.
  pub fn sort_rarest_first(&self, pictures: &mut [usize]) {
    pictures.sort_by_key(|idx| self.get(*idx));
  }
}
