//! Feature extraction: one person record → flat list of observations.
//!
//! Deterministic and side-effect-free; everything downstream (subtraction,
//! intersection, question assembly) works on the list produced here.

use personbench_core::{BoundingBox, Person, admit_threshold, deny_threshold, face_attrs::FACE_ATTR_NAMES};

use crate::observation::{AttrValue, ClothingValue, HoiValue, Observation, PoseValue};

/// Head-pose bucket half-width in degrees.
const POSE_BUCKET_DEGREES: f64 = 15.0;

/// Minimum agreement between the two landmark sources for a facial part box
/// to be trusted.
const LANDMARK_AGREEMENT_IOU: f64 = 0.5;

/// Facial parts cross-validated between the landmark detector and the
/// skeleton's facial key points.
const LANDMARK_PARTS: [&str; 6] = ["nose", "mouth", "left_eye", "right_eye", "left_eyebrow", "right_eyebrow"];

#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
  /// Drop clothing items the annotator was not confident about.
  pub only_confident_clothing: bool,
}

impl Default for ExtractOptions {
  fn default() -> Self {
    Self {
      only_confident_clothing: true,
    }
  }
}

/// Extract the full typed feature list of one person.
pub fn extract(person: &Person, opts: ExtractOptions) -> Vec<Observation> {
  let mut out = Vec::new();

  if person.face_seen() {
    extract_facial(person, &mut out);
    extract_landmark_boxes(person, &mut out);
  }
  extract_overall(person, &mut out);

  for item in person.clothing_list(opts.only_confident_clothing) {
    out.push(Observation::new(
      "clothing",
      AttrValue::Clothing(ClothingValue {
        name: item.name.clone(),
        color: item.color.clone(),
        kind: item.kind.clone(),
      }),
    ));
  }

  for hoi in &person.hois {
    out.push(Observation::new(
      "hoi",
      AttrValue::Hoi(HoiValue {
        relation: hoi.position_action_pairs(),
        object: hoi.object_name().to_string(),
        bbox: hoi.object_box(),
      }),
    ));
  }

  if let Some(face) = person.face_box {
    out.push(Observation::new("face", AttrValue::Box(face)));
  }
  if let Some(body) = person.body_box {
    out.push(Observation::new("body", AttrValue::Box(body)));
  }

  out
}

/// Boolean facial traits plus head-pose buckets. Confidences between the
/// deny and admit thresholds emit an unknown slot: later subtraction must
/// see "ambiguous", not "absent".
fn extract_facial(person: &Person, out: &mut Vec<Observation>) {
  if person.has_face_attrs() {
    for name in FACE_ATTR_NAMES {
      let conf = person.face_attr_confidence(name).unwrap_or(0.0);
      let admit = admit_threshold(name).unwrap_or(1.0);
      let deny = deny_threshold(name).unwrap_or(0.0);
      let value = if conf >= admit {
        Some(true)
      } else if conf < deny {
        Some(false)
      } else {
        None
      };
      out.push(Observation::new(name, AttrValue::Flag(value)));
    }
  }

  if let Some(pitch) = person.head_pitch() {
    let bucket = if pitch >= POSE_BUCKET_DEGREES {
      Some("down".to_string())
    } else if pitch <= -POSE_BUCKET_DEGREES {
      Some("up".to_string())
    } else {
      None
    };
    out.push(Observation::new("pitch", AttrValue::Pose(PoseValue { bucket, degrees: pitch })));
  }
  if let Some(yaw) = person.head_yaw() {
    let bucket = if yaw >= POSE_BUCKET_DEGREES {
      Some("right".to_string())
    } else if yaw <= -POSE_BUCKET_DEGREES {
      Some("left".to_string())
    } else {
      None
    };
    out.push(Observation::new("yaw", AttrValue::Pose(PoseValue { bucket, degrees: yaw })));
  }
}

/// Facial part sub-boxes, emitted only when the two independent landmark
/// sources derive overlapping boxes (IoU above [`LANDMARK_AGREEMENT_IOU`]).
/// Single-source detections are treated as noise.
fn extract_landmark_boxes(person: &Person, out: &mut Vec<Observation>) {
  let (Some(landmarks), Some(skeleton)) = (&person.face_landmarks, &person.skeleton) else {
    return;
  };
  for part in LANDMARK_PARTS {
    let detected = landmarks.get(part).and_then(|pts| BoundingBox::from_key_points(pts));
    let skeletal = skeleton.get(part).and_then(|pts| BoundingBox::from_key_points(pts));
    if let (Some(a), Some(b)) = (detected, skeletal)
      && a.iou(&b) > LANDMARK_AGREEMENT_IOU
    {
      out.push(Observation::new(part, AttrValue::Box(a)));
    }
  }
}

/// Overall demographic traits. "unknown" and "complex" annotations become
/// unknown values rather than disappearing.
fn extract_overall(person: &Person, out: &mut Vec<Observation>) {
  let traits = [
    ("age", person.age()),
    ("gender", person.gender()),
    ("race", person.race()),
    ("emotion", person.emotion()),
  ];
  for (name, raw) in traits {
    let value = raw.and_then(|v| {
      if v == "unknown" || v == "complex" {
        None
      } else {
        Some(v.to_string())
      }
    });
    out.push(Observation::new(name, AttrValue::Choice(value)));
  }
}
