//! The atomic unit of the feature algebra.
//!
//! Every fact the extractor can state about a person is an `Observation`:
//! a slot (`kind` + `name`) holding a typed value. Facial, overall and
//! bounding-box slots are single-valued per person; clothing and HOI slots
//! repeat. Identity is full value equality; "same slot" is a separate,
//! weaker notion used where the algebra matches observations positionally.

use std::collections::BTreeSet;

use personbench_core::BoundingBox;
use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};

/// Attribute slot families. Dispatch in the algebra is by exhaustive match
/// on [`AttrValue`]; this enum names the family for slot matching and for
/// the serialized records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrKind {
  Facial,
  Overall,
  Clothing,
  Hoi,
  Bbox,
  Text,
}

impl AttrKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      AttrKind::Facial => "facial",
      AttrKind::Overall => "overall",
      AttrKind::Clothing => "clothing",
      AttrKind::Hoi => "hoi",
      AttrKind::Bbox => "bbox",
      AttrKind::Text => "text",
    }
  }

  /// Whether a person may carry at most one observation per slot name.
  pub fn single_valued(&self) -> bool {
    matches!(self, AttrKind::Facial | AttrKind::Overall | AttrKind::Bbox)
  }
}

/// Head-pose reading: the coarse bucket plus the raw angle for downstream
/// confidence scoring. Only the bucket takes part in value comparison within
/// the algebra; two "down" readings at different angles are the same answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoseValue {
  pub bucket: Option<String>,
  pub degrees: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClothingValue {
  pub name: String,
  pub color: Vec<String>,
  /// Wear position class ("top", "headwear", ...), used for slot-conflict
  /// filtering when assembling questions.
  #[serde(rename = "type")]
  pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoiValue {
  /// Canonicalized `(position, action)` pairs.
  pub relation: BTreeSet<(String, String)>,
  pub object: String,
  /// The interacting object's box; cleared when an interaction is shared
  /// across persons but not at the same depicted instance.
  pub bbox: Option<BoundingBox>,
}

/// Typed observation payload. `None` inside `Flag`/`Choice`/`Pose` means
/// "unknown or ambiguous" and never counts as a positive answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
  Flag(Option<bool>),
  Choice(Option<String>),
  Pose(PoseValue),
  Clothing(ClothingValue),
  Hoi(HoiValue),
  Box(BoundingBox),
  Text(String),
}

impl AttrValue {
  pub fn kind(&self) -> AttrKind {
    match self {
      AttrValue::Flag(_) | AttrValue::Pose(_) => AttrKind::Facial,
      AttrValue::Choice(_) => AttrKind::Overall,
      AttrValue::Clothing(_) => AttrKind::Clothing,
      AttrValue::Hoi(_) => AttrKind::Hoi,
      AttrValue::Box(_) => AttrKind::Bbox,
      AttrValue::Text(_) => AttrKind::Text,
    }
  }

  /// Whether this value is the "unknown/ambiguous" marker of its family.
  pub fn is_unknown(&self) -> bool {
    match self {
      AttrValue::Flag(v) => v.is_none(),
      AttrValue::Choice(v) => v.is_none(),
      AttrValue::Pose(p) => p.bucket.is_none(),
      AttrValue::Clothing(_) | AttrValue::Hoi(_) | AttrValue::Box(_) | AttrValue::Text(_) => false,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
  pub name: String,
  pub value: AttrValue,
}

impl Observation {
  pub fn new(name: impl Into<String>, value: AttrValue) -> Self {
    Self {
      name: name.into(),
      value,
    }
  }

  pub fn kind(&self) -> AttrKind {
    self.value.kind()
  }

  /// Slot match: same family and same name, regardless of value.
  pub fn same_slot(&self, other: &Observation) -> bool {
    self.kind() == other.kind() && self.name == other.name
  }

  pub fn is_unknown(&self) -> bool {
    self.value.is_unknown()
  }
}

// Serialized as the flat record shape the downstream template fillers
// consume: {"attr_type": ..., "attr_name": ..., "attr_value": ...}.
impl Serialize for Observation {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut record = serializer.serialize_struct("Observation", 3)?;
    record.serialize_field("attr_type", self.kind().as_str())?;
    record.serialize_field("attr_name", &self.name)?;
    record.serialize_field("attr_value", &self.value)?;
    record.end()
  }
}
