//! Annotation record schema.
//!
//! This mirrors the upstream labeling tool's JSON output and is treated as a
//! read-only external interface: unknown fields are ignored, missing fields
//! decode to empty/`None`, and the engine trusts the records as ground truth.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// Named groups of 2D key points, e.g. `"nose" -> [[x, y], ...]`.
pub type KeyPointGroups = BTreeMap<String, Vec<[f64; 2]>>;

/// One annotated image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PictureRecord {
  #[serde(default)]
  pub image_path: String,
  #[serde(default)]
  pub detect_results: DetectResults,
  #[serde(default)]
  pub persons: Vec<PersonRecord>,
  #[serde(default)]
  pub objects: Vec<ObjectRecord>,
}

/// Detector outputs referenced from persons by index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectResults {
  #[serde(default)]
  pub face_boxes: Vec<BoundingBox>,
  #[serde(default)]
  pub body_boxes: Vec<BoundingBox>,
  /// Pose-estimator skeletons; facial key points grouped by part name.
  #[serde(default)]
  pub skeletons: Vec<KeyPointGroups>,
  /// Dense facial-landmark detections, grouped by part name.
  #[serde(default)]
  pub face_landmarks: Vec<KeyPointGroups>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonRecord {
  #[serde(default)]
  pub deleted: bool,
  #[serde(default)]
  pub without_face: bool,
  #[serde(default)]
  pub face_box: Option<usize>,
  #[serde(default)]
  pub body_box: Option<usize>,
  #[serde(default)]
  pub skeleton: Option<usize>,
  #[serde(default)]
  pub face_landmarks: Option<usize>,
  #[serde(default)]
  pub facex_detailing: Option<FacexDetailing>,
  #[serde(default)]
  pub qwen_detailing: QwenDetailing,
  #[serde(default)]
  pub hoi: Vec<HoiRecord>,
}

/// Face-attribute model output: per-attribute confidences plus head pose.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FacexDetailing {
  #[serde(default)]
  pub attributes: BTreeMap<String, f64>,
  /// Head pitch in degrees, positive looking down.
  #[serde(default)]
  pub pitch: Option<f64>,
  /// Head yaw in degrees, positive looking right.
  #[serde(default)]
  pub yaw: Option<f64>,
}

/// Vision-language model detailing for the whole person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QwenDetailing {
  #[serde(default = "default_true")]
  pub face_seen: bool,
  #[serde(default)]
  pub background: bool,
  #[serde(default)]
  pub age: Option<String>,
  #[serde(default)]
  pub gender: Option<String>,
  #[serde(default)]
  pub race: Option<String>,
  #[serde(default)]
  pub emotion: Option<String>,
  #[serde(default)]
  pub clothing: ClothingField,
}

impl Default for QwenDetailing {
  fn default() -> Self {
    Self {
      face_seen: true,
      background: false,
      age: None,
      gender: None,
      race: None,
      emotion: None,
      clothing: ClothingField::default(),
    }
  }
}

/// The clothing field appears in two historical shapes: a bare list, or a
/// group carrying a `vague` flag over the whole person.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClothingField {
  List(Vec<ClothingItem>),
  Grouped {
    #[serde(default)]
    vague: bool,
    #[serde(default)]
    clothing: Vec<ClothingItem>,
  },
}

impl Default for ClothingField {
  fn default() -> Self {
    ClothingField::List(Vec::new())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClothingItem {
  pub name: String,
  #[serde(default)]
  pub color: Vec<String>,
  /// Wear position class, e.g. "top", "bottom", "headwear".
  #[serde(default, rename = "type")]
  pub kind: Option<String>,
  #[serde(default = "default_true")]
  pub belonging_confident: bool,
  #[serde(default = "default_true")]
  pub existence_confident: bool,
}

/// One human-object interaction, referencing a picture-level object by index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoiRecord {
  #[serde(default)]
  pub deleted: bool,
  #[serde(default)]
  pub object: usize,
  #[serde(default)]
  pub relationship: Relationship,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Relationship {
  /// `(position, action)` pairs as labeled, positions unsimplified.
  #[serde(default)]
  pub action: Vec<(String, String)>,
  #[serde(default)]
  pub negative_action: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectRecord {
  #[serde(default)]
  pub deleted: bool,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub possible_names: Vec<String>,
  #[serde(default, rename = "box")]
  pub bbox: Option<BoundingBox>,
}

fn default_true() -> bool {
  true
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_missing_fields_decode_to_defaults() {
    let record: PictureRecord = serde_json::from_str(r#"{"image_path": "a.jpg"}"#).unwrap();
    assert_eq!(record.image_path, "a.jpg");
    assert!(record.persons.is_empty());
    assert!(record.objects.is_empty());
  }

  #[test]
  fn test_clothing_field_both_shapes() {
    let bare: QwenDetailing =
      serde_json::from_str(r#"{"clothing": [{"name": "jacket", "color": ["red"], "type": "top"}]}"#).unwrap();
    match bare.clothing {
      ClothingField::List(items) => assert_eq!(items[0].name, "jacket"),
      ClothingField::Grouped { .. } => panic!("expected bare list"),
    }

    let grouped: QwenDetailing =
      serde_json::from_str(r#"{"clothing": {"vague": true, "clothing": [{"name": "shirt"}]}}"#).unwrap();
    match grouped.clothing {
      ClothingField::Grouped { vague, clothing } => {
        assert!(vague);
        assert_eq!(clothing[0].name, "shirt");
        assert!(clothing[0].belonging_confident);
      }
      ClothingField::List(_) => panic!("expected grouped form"),
    }
  }

  #[test]
  fn test_face_seen_defaults_true() {
    let detailing: QwenDetailing = serde_json::from_str("{}").unwrap();
    assert!(detailing.face_seen);
    assert!(!detailing.background);
  }

  #[test]
  fn test_boxes_decode_from_tuples() {
    let detect: DetectResults = serde_json::from_str(r#"{"face_boxes": [[0.1, 0.2, 0.3, 0.4]]}"#).unwrap();
    assert_eq!(detect.face_boxes[0], BoundingBox::new(0.1, 0.2, 0.3, 0.4));
  }
}
