//! Body-part position taxonomy.
//!
//! Raw annotation positions are free-form ("left shoulder", "reins", "lap");
//! `simplify` folds them onto a small set of canonical regions. Two curated
//! relations then drive HOI matching: `includes` (broader-region match, used
//! by intersection and query expansion) and `excludes` (regions an
//! interaction at one part can be conclusively told apart from, used by
//! subtraction). Both are directional.

/// Fold a raw annotated position onto its canonical region. Identity when no
/// entry exists, so unknown labels pass through unchanged.
pub fn simplify(raw: &str) -> &str {
  match raw {
    "headscarf" => "head",
    "shoulder" => "body",
    "ears" => "head",
    "thighs" => "thigh",
    "hands" => "hand",
    "right eye" => "face",
    "right ear" => "head",
    "right half of the face" => "face",
    "mirror" => "hand",
    "nose" => "face",
    "forehead" => "head",
    "eyes" => "face",
    "wrists" => "hand",
    "arm" => "hand",
    "tongue" => "face",
    "lip" => "face",
    "eyebrows" => "face",
    "himself" => "body",
    "back" => "body",
    "left arm" => "hand",
    "reins" => "hand",
    "hair" => "head",
    "lap" => "thigh",
    "mouth" => "face",
    "left shoulder" => "body",
    "pen" => "hand",
    "mask" => "face",
    "left chest" => "body",
    other => other,
  }
}

/// Finer positions a canonical region subsumes.
fn include_entries(position: &str) -> &'static [&'static str] {
  match position {
    "hand" => &["left hand", "right hand", "both hands", "hands", "wrist", "fingers"],
    "head" => &["face", "hair", "forehead", "ear"],
    "face" => &["mouth", "nose", "eyes", "chin"],
    "body" => &["chest", "back", "shoulder", "waist"],
    "thigh" => &["lap", "knee"],
    "foot" => &["left foot", "right foot", "feet"],
    _ => &[],
  }
}

/// Regions an interaction at `position` is conclusively distinct from.
fn exclude_entries(position: &str) -> &'static [&'static str] {
  match position {
    "hand" => &["body", "thigh", "head", "face", "foot"],
    "head" => &["hand", "thigh", "foot"],
    "face" => &["hand", "thigh", "foot"],
    "body" => &["hand", "foot"],
    "thigh" => &["hand", "head", "face"],
    "foot" => &["hand", "head", "face", "thigh"],
    _ => &[],
  }
}

/// True if `b` equals `a` or `a`'s region subsumes `b`.
pub fn includes(a: &str, b: &str) -> bool {
  a == b || include_entries(a).contains(&b)
}

/// True if `b` equals `a` or is listed as conclusively distinct from `a`.
pub fn excludes(a: &str, b: &str) -> bool {
  a == b || exclude_entries(a).contains(&b)
}

/// Position labels counting as the hand region, in both raw and canonical
/// form. Matching is exercised before simplification in the query path, so
/// the raw variants are listed explicitly.
pub const HAND_POSITIONS: &[&str] = &["hand", "both hands", "left hand", "right hand"];

/// Action labels that always imply a hand interaction.
pub const HOLD_ACTIONS: &[&str] = &["holding", "hold", "holds"];

pub fn is_hand_position(position: &str) -> bool {
  HAND_POSITIONS.contains(&position)
}

pub fn is_hold_action(action: &str) -> bool {
  HOLD_ACTIONS.contains(&action)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_simplify_known_and_unknown() {
    assert_eq!(simplify("left shoulder"), "body");
    assert_eq!(simplify("lap"), "thigh");
    assert_eq!(simplify("hands"), "hand");
    assert_eq!(simplify("left hand"), "left hand");
  }

  #[test]
  fn test_include_exclude_asymmetry() {
    assert!(excludes("hand", "body"));
    assert!(!includes("hand", "body"));
    assert!(includes("hand", "left hand"));
  }

  #[test]
  fn test_identity() {
    assert!(includes("hand", "hand"));
    assert!(excludes("hand", "hand"));
    assert!(includes("unmapped part", "unmapped part"));
  }

  #[test]
  fn test_foot_exclusions_omit_hand_variants() {
    // The exclude table only names canonical regions; "left hand" is not
    // excluded from "foot" unless the hold rule forces it in.
    assert!(excludes("foot", "hand"));
    assert!(!excludes("foot", "left hand"));
  }

  #[test]
  fn test_hand_and_hold_constants() {
    assert!(is_hand_position("both hands"));
    assert!(!is_hand_position("foot"));
    assert!(is_hold_action("holding"));
    assert!(!is_hold_action("kicking"));
  }
}
