//! Set subtraction and intersection over observation lists.
//!
//! Subtraction answers "what does A have that B cannot be confused with";
//! intersection answers "what do A and B visibly share". Equality is
//! type-specific: plain value comparison for facial/overall slots, IoU for
//! boxes, synonym-aware matching for clothing and interactions, fuzzy
//! token matching for text. Subtraction only ever removes, which is what
//! makes the cross-person fold order-independent.

use vocab::position;
use vocab::{SynonymStore, Vocabulary};

use crate::error::{AlgebraError, Result};
use crate::observation::{AttrValue, ClothingValue, HoiValue, Observation};
use crate::similarity::token_sort_ratio;

/// Boxes whose IoU is at or above this overlap are the same detection.
const BBOX_OVERLAP_IOU: f64 = 0.5;

/// IoU above which two interaction object boxes depict the same instance.
const HOI_SAME_INSTANCE_IOU: f64 = 0.99;

/// Fuzzy-text score at or above which two text observations coincide.
const TEXT_MATCH_SCORE: u32 = 80;

/// Observations in `a` not matched, under the type-specific rules, by any
/// observation in `b`.
pub fn subtract(a: &[Observation], b: &[Observation], store: &SynonymStore) -> Result<Vec<Observation>> {
  let mut out = Vec::new();
  for oa in a {
    let matches = slot_matches(oa, b)?;
    let retained = match &oa.value {
      AttrValue::Flag(_) | AttrValue::Choice(_) | AttrValue::Pose(_) => match matches.first() {
        None => true,
        // An unknown value on the other side is never grounds to keep `oa`
        // as distinguishing: uncertainty must not manufacture uniqueness.
        Some(m) => !value_eq(&oa.value, &m.value) && !m.is_unknown(),
      },
      AttrValue::Box(box_a) => match matches.first() {
        None => true,
        Some(m) => match &m.value {
          AttrValue::Box(box_b) => box_a.iou(box_b) < BBOX_OVERLAP_IOU,
          _ => true,
        },
      },
      AttrValue::Clothing(ca) => !matches.iter().any(|m| match &m.value {
        AttrValue::Clothing(cb) => clothing_subsumes(ca, cb, store),
        _ => false,
      }),
      AttrValue::Hoi(ha) => !matches.iter().any(|m| match &m.value {
        AttrValue::Hoi(hb) => hoi_subsumes(ha, hb, store),
        _ => false,
      }),
      AttrValue::Text(ta) => !matches.iter().any(|m| match &m.value {
        AttrValue::Text(tb) => token_sort_ratio(ta, tb) >= TEXT_MATCH_SCORE,
        _ => false,
      }),
    };
    if retained {
      out.push(oa.clone());
    }
  }
  Ok(out)
}

/// Observations common to `a` and `b` under the type-specific rules.
/// Bounding boxes never intersect (position is person-specific), nor does
/// free text.
pub fn intersect(a: &[Observation], b: &[Observation], store: &SynonymStore) -> Result<Vec<Observation>> {
  let mut out = Vec::new();
  for oa in a {
    let matches = slot_matches(oa, b)?;
    match &oa.value {
      AttrValue::Flag(_) | AttrValue::Choice(_) | AttrValue::Pose(_) => {
        if let Some(m) = matches.first()
          && value_eq(&oa.value, &m.value)
          && !oa.is_unknown()
          && !m.is_unknown()
        {
          out.push(oa.clone());
        }
      }
      AttrValue::Clothing(ca) => {
        let found = matches.iter().any(|m| match &m.value {
          AttrValue::Clothing(cb) => clothing_mutual(ca, cb, store),
          _ => false,
        });
        if found {
          out.push(oa.clone());
        }
      }
      AttrValue::Hoi(ha) => {
        for m in &matches {
          let AttrValue::Hoi(hb) = &m.value else { continue };
          if hoi_shared(ha, hb, store) {
            if same_hoi_instance(ha, hb) {
              out.push(oa.clone());
            } else {
              // Shared interaction, different depicted instance: keep it
              // without claiming a location.
              let mut cleared = ha.clone();
              cleared.bbox = None;
              out.push(Observation::new(oa.name.clone(), AttrValue::Hoi(cleared)));
            }
            break;
          }
        }
      }
      AttrValue::Box(_) | AttrValue::Text(_) => {}
    }
  }
  Ok(out)
}

/// All observations in `b` occupying `oa`'s slot, with the single-valued
/// contract enforced: more than one match for a facial/overall/bbox slot
/// means the upstream per-person data is malformed.
fn slot_matches<'b>(oa: &Observation, b: &'b [Observation]) -> Result<Vec<&'b Observation>> {
  let matches: Vec<&Observation> = b.iter().filter(|ob| ob.same_slot(oa)).collect();
  if oa.kind().single_valued() && matches.len() > 1 {
    return Err(AlgebraError::DataIntegrity {
      kind: oa.kind().as_str(),
      name: oa.name.clone(),
      count: matches.len(),
    });
  }
  Ok(matches)
}

/// Value comparison for single-valued slots. Pose values compare by bucket
/// only; the raw angle is carried for scoring, not identity.
fn value_eq(a: &AttrValue, b: &AttrValue) -> bool {
  match (a, b) {
    (AttrValue::Pose(pa), AttrValue::Pose(pb)) => pa.bucket == pb.bucket,
    _ => a == b,
  }
}

/// Clothing match for subtraction: the other item's type is synonymous and
/// at least one color pair coincides.
fn clothing_subsumes(a: &ClothingValue, b: &ClothingValue, store: &SynonymStore) -> bool {
  let type_match = store.is_synonym(Vocabulary::Clothing, &a.name, &b.name);
  let color_match = a
    .color
    .iter()
    .any(|ac| b.color.iter().any(|bc| store.is_synonym(Vocabulary::Clothing, ac, bc)));
  type_match && color_match
}

/// Clothing match for intersection: synonymous type and mutual color
/// coverage — every color on each side has a counterpart on the other.
/// An item with no color at all never intersects.
fn clothing_mutual(a: &ClothingValue, b: &ClothingValue, store: &SynonymStore) -> bool {
  if !store.is_synonym(Vocabulary::Clothing, &a.name, &b.name) {
    return false;
  }
  let covered = |from: &[String], to: &[String]| {
    !from.is_empty() && from.iter().all(|x| to.iter().any(|y| store.is_synonym(Vocabulary::Clothing, x, y)))
  };
  covered(&a.color, &b.color) && covered(&b.color, &a.color)
}

/// HOI match for subtraction: some relation pair has a synonymous action at
/// a position the other's position conclusively excludes (or equals), and
/// the object names coincide. Holding forces hand positions into the
/// exclusion set: a "hold" can only ever happen at a hand, so a same-action
/// match elsewhere is the same interaction seen loosely, not a new one.
fn hoi_subsumes(a: &HoiValue, b: &HoiValue, store: &SynonymStore) -> bool {
  if !store.is_synonym(Vocabulary::Hoi, &a.object, &b.object) {
    return false;
  }
  a.relation.iter().any(|(pos_a, act_a)| {
    b.relation.iter().any(|(pos_b, act_b)| {
      store.is_synonym(Vocabulary::Hoi, act_a, act_b) && position_excluded(pos_b, pos_a, act_a, act_b, store)
    })
  })
}

fn position_excluded(pos_b: &str, pos_a: &str, act_a: &str, act_b: &str, store: &SynonymStore) -> bool {
  if position::excludes(pos_b, pos_a) {
    return true;
  }
  if position::is_hand_position(pos_a) {
    let expanded = store.expand(Vocabulary::Hoi, [act_a, act_b]);
    if expanded.iter().any(|action| position::is_hold_action(action)) {
      return true;
    }
  }
  false
}

/// HOI match for intersection. Action match and position match are tracked
/// independently across all relation pairs — deliberately looser than
/// requiring both on the same pair.
fn hoi_shared(a: &HoiValue, b: &HoiValue, store: &SynonymStore) -> bool {
  if !store.is_synonym(Vocabulary::Hoi, &a.object, &b.object) {
    return false;
  }
  let mut action_match = false;
  let mut position_match = false;
  for (pos_a, act_a) in &a.relation {
    for (pos_b, act_b) in &b.relation {
      if store.is_synonym(Vocabulary::Hoi, act_a, act_b) {
        action_match = true;
      }
      if position::includes(pos_b, pos_a) {
        position_match = true;
      }
    }
  }
  action_match && position_match
}

fn same_hoi_instance(a: &HoiValue, b: &HoiValue) -> bool {
  match (&a.bbox, &b.bbox) {
    (Some(box_a), Some(box_b)) => box_a.iou(box_b) > HOI_SAME_INSTANCE_IOU,
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use personbench_core::BoundingBox;
  use vocab::SynonymDict;

  use super::*;
  use crate::observation::PoseValue;

  fn store() -> SynonymStore {
    let mut clothing = SynonymDict::default();
    clothing.add_synonym("jacket", "coat");
    clothing.add_synonym("crimson", "red");
    let mut hoi = SynonymDict::default();
    hoi.add_synonym("grasping", "holding");
    hoi.add_synonym("cup", "mug");
    SynonymStore::new(clothing, hoi, SynonymDict::default())
  }

  fn flag(name: &str, v: Option<bool>) -> Observation {
    Observation::new(name, AttrValue::Flag(v))
  }

  fn choice(name: &str, v: Option<&str>) -> Observation {
    Observation::new(name, AttrValue::Choice(v.map(str::to_string)))
  }

  fn bbox(name: &str, x1: f64, y1: f64, x2: f64, y2: f64) -> Observation {
    Observation::new(name, AttrValue::Box(BoundingBox::new(x1, y1, x2, y2)))
  }

  fn clothing(name: &str, colors: &[&str]) -> Observation {
    Observation::new(
      "clothing",
      AttrValue::Clothing(ClothingValue {
        name: name.into(),
        color: colors.iter().map(|c| c.to_string()).collect(),
        kind: None,
      }),
    )
  }

  fn hoi(object: &str, pairs: &[(&str, &str)], bbox: Option<BoundingBox>) -> Observation {
    let relation: BTreeSet<(String, String)> = pairs.iter().map(|(p, a)| (p.to_string(), a.to_string())).collect();
    Observation::new(
      "hoi",
      AttrValue::Hoi(HoiValue {
        relation,
        object: object.into(),
        bbox,
      }),
    )
  }

  // --- subtraction -------------------------------------------------------

  #[test]
  fn test_subtract_is_subset_of_a() {
    let a = vec![flag("Male", Some(true)), choice("age", Some("young"))];
    let b = vec![flag("Male", Some(false))];
    let c = subtract(&a, &b, &store()).unwrap();
    assert!(c.iter().all(|o| a.contains(o)));
  }

  #[test]
  fn test_subtract_flag_differs_kept() {
    let a = vec![flag("Male", Some(true))];
    let b = vec![flag("Male", Some(false))];
    assert_eq!(subtract(&a, &b, &store()).unwrap().len(), 1);
  }

  #[test]
  fn test_subtract_flag_equal_dropped() {
    let a = vec![flag("Male", Some(true))];
    let b = vec![flag("Male", Some(true))];
    assert!(subtract(&a, &b, &store()).unwrap().is_empty());
  }

  #[test]
  fn test_subtract_unknown_in_b_drops_a() {
    // B being unsure about the attribute must not make A's value "unique".
    let a = vec![flag("Male", Some(true))];
    let b = vec![flag("Male", None)];
    assert!(subtract(&a, &b, &store()).unwrap().is_empty());
  }

  #[test]
  fn test_subtract_no_match_kept() {
    let a = vec![flag("Male", Some(true))];
    assert_eq!(subtract(&a, &[], &store()).unwrap().len(), 1);
  }

  #[test]
  fn test_subtract_pose_compares_bucket_not_degrees() {
    let a = vec![Observation::new(
      "pitch",
      AttrValue::Pose(PoseValue {
        bucket: Some("down".into()),
        degrees: 20.0,
      }),
    )];
    let b = vec![Observation::new(
      "pitch",
      AttrValue::Pose(PoseValue {
        bucket: Some("down".into()),
        degrees: 35.0,
      }),
    )];
    assert!(subtract(&a, &b, &store()).unwrap().is_empty());
  }

  #[test]
  fn test_subtract_bbox_iou_boundary() {
    // Construct pairs at IoU 0.49 / 0.50 / 0.51: fixed 1.0-wide strips of
    // height h overlapping by o give IoU = o / (2h - o).
    let pair = |iou: f64| {
      let h = 0.4;
      let o = 2.0 * h * iou / (1.0 + iou);
      (bbox("body", 0.0, 0.0, 1.0, h), bbox("body", 0.0, h - o, 1.0, 2.0 * h - o))
    };

    for (target, expect_kept) in [(0.49, true), (0.50, false), (0.51, false)] {
      let (a, b) = pair(target);
      if let (AttrValue::Box(ba), AttrValue::Box(bb)) = (&a.value, &b.value) {
        assert!((ba.iou(bb) - target).abs() < 1e-9);
      }
      let c = subtract(&[a], &[b], &store()).unwrap();
      assert_eq!(!c.is_empty(), expect_kept, "iou {}", target);
    }
  }

  #[test]
  fn test_subtract_clothing_synonym_collapses() {
    let a = vec![clothing("jacket", &["red"])];
    let b = vec![clothing("coat", &["crimson"])];
    assert!(subtract(&a, &b, &store()).unwrap().is_empty());
  }

  #[test]
  fn test_subtract_clothing_distinct_kept() {
    let a = vec![clothing("jacket", &["red"])];
    let b = vec![clothing("shirt", &["blue"])];
    assert_eq!(subtract(&a, &b, &store()).unwrap().len(), 1);
  }

  #[test]
  fn test_subtract_clothing_needs_color_overlap() {
    // Same type but disjoint colors still distinguishes.
    let a = vec![clothing("jacket", &["red"])];
    let b = vec![clothing("jacket", &["blue"])];
    assert_eq!(subtract(&a, &b, &store()).unwrap().len(), 1);
  }

  #[test]
  fn test_subtract_hoi_same_position_same_action() {
    let a = vec![hoi("cup", &[("hand", "holding")], None)];
    let b = vec![hoi("mug", &[("hand", "grasping")], None)];
    assert!(subtract(&a, &b, &store()).unwrap().is_empty());
  }

  #[test]
  fn test_subtract_hoi_excluded_position_collapses() {
    // "hand" excludes "body": same action on the same object at a
    // conclusively different part still counts as matched.
    let a = vec![hoi("cup", &[("body", "holding")], None)];
    let b = vec![hoi("cup", &[("hand", "holding")], None)];
    assert!(subtract(&a, &b, &store()).unwrap().is_empty());
  }

  #[test]
  fn test_subtract_hoi_different_object_kept() {
    let a = vec![hoi("cup", &[("hand", "holding")], None)];
    let b = vec![hoi("ball", &[("hand", "holding")], None)];
    assert_eq!(subtract(&a, &b, &store()).unwrap().len(), 1);
  }

  #[test]
  fn test_subtract_hoi_hold_forces_hand_exclusion() {
    // foot's exclude table does not name "left hand", but the action being
    // a hold forces hand positions into the exclusion set, so the two
    // interactions collapse. Table-driven outcome, pinned here.
    let a = vec![hoi("ball", &[("left hand", "holding")], None)];
    let b = vec![hoi("ball", &[("foot", "holding")], None)];
    assert!(subtract(&a, &b, &store()).unwrap().is_empty());

    // Without a hold action the same positions stay distinct.
    let a = vec![hoi("ball", &[("left hand", "carrying")], None)];
    let b = vec![hoi("ball", &[("foot", "carrying")], None)];
    assert_eq!(subtract(&a, &b, &store()).unwrap().len(), 1);
  }

  #[test]
  fn test_subtract_text_fuzzy() {
    let a = vec![Observation::new("caption", AttrValue::Text("red jacket worn".into()))];
    let close = vec![Observation::new("caption", AttrValue::Text("worn red jacket".into()))];
    let far = vec![Observation::new("caption", AttrValue::Text("wooden chair".into()))];
    assert!(subtract(&a, &close, &store()).unwrap().is_empty());
    assert_eq!(subtract(&a, &far, &store()).unwrap().len(), 1);
  }

  #[test]
  fn test_subtract_self_empties_known_values() {
    let a = vec![
      flag("Male", Some(true)),
      choice("age", Some("young")),
      clothing("jacket", &["red"]),
      hoi("cup", &[("hand", "holding")], None),
      flag("Smiling", None),
    ];
    let c = subtract(&a, &a, &store()).unwrap();
    // Even the unknown flag drops: its self-match is unknown.
    assert!(c.is_empty());
  }

  #[test]
  fn test_subtract_duplicate_single_valued_is_error() {
    let a = vec![flag("Male", Some(true))];
    let b = vec![flag("Male", Some(false)), flag("Male", Some(true))];
    let err = subtract(&a, &b, &store()).unwrap_err();
    assert!(matches!(err, AlgebraError::DataIntegrity { .. }));
  }

  // --- intersection ------------------------------------------------------

  #[test]
  fn test_intersect_flag_agreement() {
    let a = vec![flag("Male", Some(true)), flag("Smiling", Some(false))];
    let b = vec![flag("Male", Some(true)), flag("Smiling", Some(true))];
    let c = intersect(&a, &b, &store()).unwrap();
    assert_eq!(c, vec![flag("Male", Some(true))]);
  }

  #[test]
  fn test_intersect_symmetric_on_value_types() {
    let a = vec![flag("Male", Some(true)), choice("age", Some("young"))];
    let b = vec![flag("Male", Some(true)), choice("age", Some("old"))];
    let ab = intersect(&a, &b, &store()).unwrap();
    let ba = intersect(&b, &a, &store()).unwrap();
    assert_eq!(ab, ba);
  }

  #[test]
  fn test_intersect_unknowns_never_shared() {
    let a = vec![flag("Male", None)];
    let b = vec![flag("Male", None)];
    assert!(intersect(&a, &b, &store()).unwrap().is_empty());
  }

  #[test]
  fn test_intersect_bbox_never() {
    let a = vec![bbox("face", 0.0, 0.0, 0.5, 0.5)];
    let b = vec![bbox("face", 0.0, 0.0, 0.5, 0.5)];
    assert!(intersect(&a, &b, &store()).unwrap().is_empty());
  }

  #[test]
  fn test_intersect_clothing_mutual_coverage() {
    // One-way coverage is not enough: b carries an extra unmatched color.
    let a = vec![clothing("jacket", &["red"])];
    let b = vec![clothing("coat", &["crimson", "green"])];
    assert!(intersect(&a, &b, &store()).unwrap().is_empty());

    let b = vec![clothing("coat", &["crimson"])];
    assert_eq!(intersect(&a, &b, &store()).unwrap().len(), 1);
  }

  #[test]
  fn test_intersect_hoi_same_instance_keeps_box() {
    let shared_box = BoundingBox::new(0.4, 0.4, 0.6, 0.6);
    let a = vec![hoi("cup", &[("hand", "holding")], Some(shared_box))];
    let b = vec![hoi("mug", &[("hand", "grasping")], Some(shared_box))];
    let c = intersect(&a, &b, &store()).unwrap();
    assert_eq!(c.len(), 1);
    match &c[0].value {
      AttrValue::Hoi(h) => assert_eq!(h.bbox, Some(shared_box)),
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn test_intersect_hoi_different_instance_clears_box() {
    let a = vec![hoi(
      "cup",
      &[("hand", "holding")],
      Some(BoundingBox::new(0.1, 0.1, 0.3, 0.3)),
    )];
    let b = vec![hoi(
      "cup",
      &[("hand", "holding")],
      Some(BoundingBox::new(0.6, 0.6, 0.8, 0.8)),
    )];
    let c = intersect(&a, &b, &store()).unwrap();
    assert_eq!(c.len(), 1);
    match &c[0].value {
      AttrValue::Hoi(h) => assert!(h.bbox.is_none()),
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn test_intersect_hoi_loose_pair_tracking() {
    // Action matches on one pair, position includes on another pair; the
    // match is still accepted (tracked independently across pairs).
    let a = vec![hoi("cup", &[("hand", "holding"), ("face", "drinking from")], None)];
    let b = vec![hoi("cup", &[("hand", "drinking from"), ("face", "holding")], None)];
    let c = intersect(&a, &b, &store()).unwrap();
    assert_eq!(c.len(), 1);
  }

  #[test]
  fn test_intersect_kind_mismatch_same_name() {
    // A "face" text observation must not collide with the "face" bbox slot.
    let a = vec![bbox("face", 0.0, 0.0, 0.5, 0.5)];
    let b = vec![Observation::new("face", AttrValue::Text("a face".into()))];
    assert!(intersect(&a, &b, &store()).unwrap().is_empty());
    assert_eq!(subtract(&a, &b, &store()).unwrap().len(), 1);
  }

  #[test]
  fn test_two_person_clothing_scenario() {
    // Person A wears a red jacket, person B a blue shirt, no synonyms:
    // both items are unique, nothing is shared.
    let a = vec![clothing("jacket", &["red"])];
    let b = vec![clothing("shirt", &["blue"])];
    let s = store();
    assert_eq!(subtract(&a, &b, &s).unwrap().len(), 1);
    assert_eq!(subtract(&b, &a, &s).unwrap().len(), 1);
    assert!(intersect(&a, &b, &s).unwrap().is_empty());
  }

  #[test]
  fn test_single_valued_assert_checks_kind() {
    // Two clothing observations share a slot name legally (multi-valued).
    let a = vec![clothing("jacket", &["red"])];
    let b = vec![clothing("shirt", &["blue"]), clothing("scarf", &["green"])];
    assert!(subtract(&a, &b, &store()).is_ok());
  }
}
