//! Read-only person and interaction views over annotation records.
//!
//! A `Person` is built once per picture load and never mutated afterwards;
//! derived quantities that are repeatedly consulted by the generators (areas,
//! admit/deny attribute sets) are computed lazily and cached for the
//! object's lifetime.

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use vocab::position;

use crate::face_attrs::{FACE_ATTR_ADMIT, FACE_ATTR_NAMES};
use crate::geometry::BoundingBox;
use crate::schema::{ClothingField, ClothingItem, DetectResults, KeyPointGroups, PersonRecord, Relationship};

/// A picture-level interaction target, shared by every HOI referencing it.
#[derive(Debug, Clone, PartialEq)]
pub struct HoiObject {
  pub name: String,
  pub possible_names: Vec<String>,
  pub bbox: Option<BoundingBox>,
}

/// One human-object interaction of one person.
#[derive(Debug, Clone)]
pub struct Hoi {
  relationship: Relationship,
  object: Arc<HoiObject>,
}

impl Hoi {
  pub fn new(relationship: Relationship, object: Arc<HoiObject>) -> Self {
    Self { relationship, object }
  }

  pub fn actions(&self) -> BTreeSet<&str> {
    self.relationship.action.iter().map(|(_, action)| action.as_str()).collect()
  }

  /// Canonicalized positions of this interaction.
  pub fn positions(&self) -> BTreeSet<&str> {
    self
      .relationship
      .action
      .iter()
      .map(|(pos, _)| position::simplify(pos))
      .collect()
  }

  /// Canonicalized `(position, action)` pairs.
  pub fn position_action_pairs(&self) -> BTreeSet<(String, String)> {
    self
      .relationship
      .action
      .iter()
      .map(|(pos, action)| (position::simplify(pos).to_string(), action.clone()))
      .collect()
  }

  pub fn negative_actions(&self) -> &[String] {
    &self.relationship.negative_action
  }

  pub fn object_name(&self) -> &str {
    &self.object.name
  }

  /// Possible aliases of the interaction target.
  pub fn object_names(&self) -> impl Iterator<Item = &str> {
    self.object.possible_names.iter().map(String::as_str)
  }

  pub fn object_box(&self) -> Option<BoundingBox> {
    self.object.bbox
  }
}

#[derive(Debug)]
pub struct Person {
  record: PersonRecord,
  pub face_box: Option<BoundingBox>,
  pub body_box: Option<BoundingBox>,
  pub skeleton: Option<KeyPointGroups>,
  pub face_landmarks: Option<KeyPointGroups>,
  pub hois: Vec<Hoi>,
  face_area: OnceLock<f64>,
  body_area: OnceLock<f64>,
  admit_set: OnceLock<BTreeSet<String>>,
  deny_set: OnceLock<BTreeSet<String>>,
}

impl Person {
  /// Resolve detector indices into concrete boxes/landmarks. Interactions
  /// are attached separately once the picture's objects exist, see
  /// [`Person::init_hois`].
  pub fn new(record: PersonRecord, detect: &DetectResults) -> Self {
    let face_box = if record.without_face {
      None
    } else {
      record.face_box.and_then(|i| detect.face_boxes.get(i).copied())
    };
    let body_box = record.body_box.and_then(|i| detect.body_boxes.get(i).copied());
    let skeleton = record.skeleton.and_then(|i| detect.skeletons.get(i).cloned());
    let face_landmarks = record.face_landmarks.and_then(|i| detect.face_landmarks.get(i).cloned());
    Self {
      record,
      face_box,
      body_box,
      skeleton,
      face_landmarks,
      hois: Vec::new(),
      face_area: OnceLock::new(),
      body_area: OnceLock::new(),
      admit_set: OnceLock::new(),
      deny_set: OnceLock::new(),
    }
  }

  /// Attach interactions, dropping deleted ones, ones whose target object no
  /// longer exists, and explicit "no interaction" placeholders.
  pub fn init_hois(&mut self, objects: &[Option<Arc<HoiObject>>]) {
    for hoi in &self.record.hoi {
      if hoi.deleted {
        continue;
      }
      if hoi.relationship.action.iter().any(|(_, action)| action == "no interaction") {
        continue;
      }
      let Some(Some(object)) = objects.get(hoi.object) else {
        continue;
      };
      self.hois.push(Hoi::new(hoi.relationship.clone(), object.clone()));
    }
  }

  /// Fraction of the image covered by the face box (whole image = 1).
  pub fn face_area(&self) -> f64 {
    *self
      .face_area
      .get_or_init(|| self.face_box.map(|b| b.area()).unwrap_or(0.0))
  }

  /// Fraction of the image covered by the body box.
  pub fn body_area(&self) -> f64 {
    *self
      .body_area
      .get_or_init(|| self.body_box.map(|b| b.area()).unwrap_or(0.0))
  }

  pub fn face_seen(&self) -> bool {
    self.record.qwen_detailing.face_seen
  }

  pub fn background(&self) -> bool {
    self.record.qwen_detailing.background
  }

  pub fn face_attr_confidence(&self, name: &str) -> Option<f64> {
    self
      .record
      .facex_detailing
      .as_ref()
      .map(|d| d.attributes.get(name).copied().unwrap_or(0.0))
  }

  pub fn head_pitch(&self) -> Option<f64> {
    self.record.facex_detailing.as_ref().and_then(|d| d.pitch)
  }

  pub fn head_yaw(&self) -> Option<f64> {
    self.record.facex_detailing.as_ref().and_then(|d| d.yaw)
  }

  pub fn has_face_attrs(&self) -> bool {
    self.record.facex_detailing.is_some()
  }

  pub fn age(&self) -> Option<&str> {
    self.record.qwen_detailing.age.as_deref()
  }

  pub fn gender(&self) -> Option<&str> {
    self.record.qwen_detailing.gender.as_deref()
  }

  pub fn race(&self) -> Option<&str> {
    self.record.qwen_detailing.race.as_deref()
  }

  pub fn emotion(&self) -> Option<&str> {
    self.record.qwen_detailing.emotion.as_deref()
  }

  /// Attributes asserted at or above their admit threshold.
  pub fn face_attr_admit_set(&self) -> &BTreeSet<String> {
    self.admit_set.get_or_init(|| {
      let Some(detailing) = &self.record.facex_detailing else {
        return BTreeSet::new();
      };
      FACE_ATTR_NAMES
        .iter()
        .zip(FACE_ATTR_ADMIT.iter())
        .filter(|(name, admit)| detailing.attributes.get(**name).copied().unwrap_or(0.0) >= **admit)
        .map(|(name, _)| name.to_string())
        .collect()
    })
  }

  /// Attributes below their admit threshold. Denial here is the complement
  /// of admission; the stricter per-attribute deny thresholds only gate
  /// answer eligibility during feature extraction.
  pub fn face_attr_deny_set(&self) -> &BTreeSet<String> {
    self.deny_set.get_or_init(|| {
      let Some(detailing) = &self.record.facex_detailing else {
        return BTreeSet::new();
      };
      FACE_ATTR_NAMES
        .iter()
        .zip(FACE_ATTR_ADMIT.iter())
        .filter(|(name, admit)| detailing.attributes.get(**name).copied().unwrap_or(0.0) < **admit)
        .map(|(name, _)| name.to_string())
        .collect()
    })
  }

  /// Joint belief that every `admit` attribute holds and every `deny`
  /// attribute does not, as a product of model confidences.
  pub fn face_attr_assert_belief<'a, A, D>(&self, admit: A, deny: D) -> f64
  where
    A: IntoIterator<Item = &'a str>,
    D: IntoIterator<Item = &'a str>,
  {
    let Some(detailing) = &self.record.facex_detailing else {
      return 0.0;
    };
    let mut result = 1.0;
    for name in admit {
      result *= detailing.attributes.get(name).copied().unwrap_or(0.0);
    }
    for name in deny {
      result *= 1.0 - detailing.attributes.get(name).copied().unwrap_or(0.0);
    }
    result
  }

  /// Clothing items, optionally restricted to confidently attributed ones.
  pub fn clothing_list(&self, only_confident: bool) -> Vec<&ClothingItem> {
    let items: &[ClothingItem] = match &self.record.qwen_detailing.clothing {
      ClothingField::List(items) => items,
      ClothingField::Grouped { vague, clothing } => {
        if only_confident && *vague {
          return Vec::new();
        }
        clothing
      }
    };
    items
      .iter()
      .filter(|c| !only_confident || (c.belonging_confident && c.existence_confident))
      .collect()
  }

  /// Whether any interaction is pinned to a hand region. Such interactions
  /// cannot be mutated into a statement about the other hand when building
  /// deliberately false questions.
  pub fn hand_cant_swap(&self) -> bool {
    self
      .hois
      .iter()
      .any(|hoi| hoi.positions().iter().any(|p| position::is_hand_position(p)))
  }
}
