//! Multi-image HOI questions.
//!
//! For every interaction in the dataset, look for contrast pictures: one
//! where the same object is interacted with at a genuinely different body
//! position, one where a different object fills the same role, and one
//! extra distractor of either kind. The query engine expands terms through
//! the synonym store and applies the position include/exclude tables plus
//! the hold/hand special rule.

use std::collections::BTreeSet;
use std::path::Path;

use personbench_core::{Hoi, Picture};
use tracing::debug;
use vocab::{SynonymStore, Vocabulary, position};

use crate::framework::{OccurrenceTracker, Question};

/// A picture-level interaction query. `None` means "unconstrained".
#[derive(Debug, Clone, Default)]
pub struct HoiQuery {
  pub objects: Option<BTreeSet<String>>,
  pub actions: Option<BTreeSet<String>>,
  pub positions: Option<BTreeSet<String>>,
  pub exclude_objects: Option<BTreeSet<String>>,
  pub exclude_actions: Option<BTreeSet<String>>,
  pub exclude_positions: Option<BTreeSet<String>>,
}

pub struct HoiFeatureGenerator<'a> {
  pub store: &'a SynonymStore,
  pub dataset_dir: &'a Path,
}

impl HoiFeatureGenerator<'_> {
  /// Pictures where at least one person has an interaction.
  pub fn filter_pictures<'p>(&self, pictures: &'p [Picture]) -> Vec<&'p Picture> {
    let filtered: Vec<&Picture> = pictures
      .iter()
      .filter(|p| p.persons.iter().any(|person| !person.hois.is_empty()))
      .collect();
    debug!(total = pictures.len(), kept = filtered.len(), "Filtered pictures for HOI questions");
    filtered
  }

  /// Indices of pictures matching the query.
  ///
  /// Positive constraints must hit on one interaction; exclusion
  /// constraints reject the whole picture when any interaction (or any
  /// picture-level object name) violates them. Two special rules: a query
  /// for hold-like actions excludes hand positions (every hold is at a
  /// hand, so a "different position" hold does not exist), and a query
  /// pinned to hand positions excludes hold-like actions for the same
  /// reason in reverse.
  pub fn find_matches(&self, pictures: &[&Picture], query: &HoiQuery, exclude_picture: Option<usize>) -> Vec<usize> {
    let objects = query.objects.as_ref().map(|terms| self.expand(terms));
    let actions = query.actions.as_ref().map(|terms| self.expand(terms));
    let exclude_objects = query.exclude_objects.as_ref().map(|terms| self.expand(terms));
    let mut exclude_actions = query.exclude_actions.as_ref().map(|terms| self.expand(terms));
    let positions = query.positions.clone();
    let mut exclude_positions = query.exclude_positions.clone();

    if let Some(actions) = &actions
      && actions.iter().any(|a| position::is_hold_action(a))
    {
      let hands = position::HAND_POSITIONS.iter().map(|p| p.to_string());
      exclude_positions.get_or_insert_with(BTreeSet::new).extend(hands);
    }

    if let Some(positions) = &positions
      && positions.iter().any(|p| position::is_hand_position(p))
      && query.actions.is_none()
    {
      let holds: BTreeSet<String> = position::HOLD_ACTIONS.iter().map(|a| a.to_string()).collect();
      let expanded_holds = self.expand(&holds);
      exclude_actions.get_or_insert_with(BTreeSet::new).extend(expanded_holds);
    }

    let mut results = Vec::new();
    'pictures: for (idx, picture) in pictures.iter().enumerate() {
      if exclude_picture == Some(idx) {
        continue;
      }

      let mut has_match = false;
      for hoi in picture.full_hoi() {
        if let Some(objects) = &objects
          && !intersects(objects, hoi.object_names())
        {
          continue;
        }
        if let Some(actions) = &actions
          && !intersects(actions, hoi.actions().iter().copied())
        {
          continue;
        }
        if let Some(positions) = &positions
          && !intersects(positions, hoi.positions().iter().copied())
        {
          continue;
        }
        if let Some(exclude) = &exclude_objects
          && intersects(exclude, hoi.object_names())
        {
          continue;
        }
        if let Some(exclude) = &exclude_actions
          && intersects(exclude, hoi.actions().iter().copied())
        {
          continue;
        }
        if let Some(exclude) = &exclude_positions
          && intersects(exclude, hoi.positions().iter().copied())
        {
          continue;
        }
        has_match = true;
        break;
      }
      if !has_match {
        continue;
      }

      // Picture-level exclusion: another interaction (or object) with an
      // excluded term poisons the whole picture as a contrast example.
      if let Some(exclude) = &exclude_objects
        && intersects(exclude, picture.object_names().into_iter())
      {
        continue;
      }
      for hoi in picture.full_hoi() {
        if let Some(exclude) = &exclude_actions
          && intersects(exclude, hoi.actions().iter().copied())
        {
          continue 'pictures;
        }
        if let Some(exclude) = &exclude_positions
          && intersects(exclude, hoi.positions().iter().copied())
        {
          continue 'pictures;
        }
      }
      results.push(idx);
    }
    results
  }

  pub fn generate(&self, pictures: &[&Picture]) -> Vec<Question> {
    let mut questions = Vec::new();
    let mut occurrence = OccurrenceTracker::new();

    for (idx, picture) in pictures.iter().enumerate() {
      for person in &picture.persons {
        for hoi in &person.hois {
          if let Some(q) = self.try_question(pictures, idx, hoi, &mut occurrence) {
            questions.push(q);
          }
        }
      }
    }
    debug!(count = questions.len(), "Generated HOI questions");
    questions
  }

  fn try_question(
    &self,
    pictures: &[&Picture],
    idx: usize,
    hoi: &Hoi,
    occurrence: &mut OccurrenceTracker,
  ) -> Option<Question> {
    let picture = pictures[idx];
    let positions: BTreeSet<String> = hoi.positions().iter().map(|p| p.to_string()).collect();
    let actions: BTreeSet<String> = hoi.actions().iter().map(|a| a.to_string()).collect();
    let object_names: BTreeSet<String> = hoi.object_names().map(str::to_string).collect();

    let include_positions: BTreeSet<String> = positions
      .iter()
      .flat_map(|p| position_includes(p))
      .collect();

    // Position exclusions gathered over every same-object interaction in
    // this picture, so a contrast picture differs from all of them at once.
    let mut exclude_positions = BTreeSet::new();
    for other in picture.full_hoi() {
      if other.object_name() != hoi.object_name() {
        continue;
      }
      for p in other.positions() {
        exclude_positions.extend(position_excludes(p));
      }
    }

    let diff_pos = self.find_matches(
      pictures,
      &HoiQuery {
        objects: Some(object_names.clone()),
        actions: Some(actions.clone()),
        exclude_positions: Some(exclude_positions),
        ..Default::default()
      },
      Some(idx),
    );
    let diff_obj = self.find_matches(
      pictures,
      &HoiQuery {
        actions: Some(actions),
        positions: Some(include_positions),
        exclude_objects: Some(object_names.clone()),
        ..Default::default()
      },
      Some(idx),
    );

    if diff_pos.is_empty() || diff_obj.is_empty() || diff_pos.len() + diff_obj.len() <= 2 {
      return None;
    }

    let mut diff_pos = diff_pos;
    let mut diff_obj = diff_obj;
    occurrence.sort_rarest_first(&mut diff_pos);
    occurrence.sort_rarest_first(&mut diff_obj);

    let target_objects = self.expand(&object_names);
    let position_diff = self.positions_on_objects(pictures[diff_pos[0]], &target_objects);

    let (extra_type, extra_diff, extra_idx) = if diff_pos.len() > 1 {
      let extra = diff_pos[1];
      (
        "position".to_string(),
        self.positions_on_objects(pictures[extra], &target_objects),
        extra,
      )
    } else {
      let extra = diff_obj[1];
      let names: Vec<String> = pictures[extra]
        .full_hoi()
        .iter()
        .map(|h| h.object_name().to_string())
        .collect();
      ("object".to_string(), names, extra)
    };

    let question = Question::MultiImageHoi {
      object: hoi.object_name().to_string(),
      hoi: hoi.position_action_pairs().into_iter().collect(),
      full: self.image(picture),
      diff_object: self.image(pictures[diff_obj[0]]),
      object_diff: pictures[diff_obj[0]]
        .full_hoi()
        .iter()
        .map(|h| h.object_name().to_string())
        .collect(),
      diff_position: self.image(pictures[diff_pos[0]]),
      position_diff,
      extra_type,
      extra_diff,
      diff_extra: self.image(pictures[extra_idx]),
    };

    occurrence.bump(idx);
    occurrence.bump(diff_obj[0]);
    occurrence.bump(diff_pos[0]);
    occurrence.bump(extra_idx);
    Some(question)
  }

  /// Positions used in `picture` on any of the target objects.
  fn positions_on_objects(&self, picture: &Picture, targets: &BTreeSet<String>) -> Vec<String> {
    let mut positions = Vec::new();
    for hoi in picture.full_hoi() {
      if intersects(targets, hoi.object_names()) {
        positions.extend(hoi.positions().iter().map(|p| p.to_string()));
      }
    }
    positions
  }

  fn expand(&self, terms: &BTreeSet<String>) -> BTreeSet<String> {
    self.store.expand(Vocabulary::Hoi, terms.iter().map(String::as_str))
  }

  fn image(&self, picture: &Picture) -> String {
    picture.image_path(self.dataset_dir).to_string_lossy().into_owned()
  }
}

fn intersects<'a, I: IntoIterator<Item = &'a str>>(set: &BTreeSet<String>, items: I) -> bool {
  items.into_iter().any(|item| set.contains(item))
}

/// A position plus everything its region subsumes.
fn position_includes(position: &str) -> Vec<String> {
  let mut out = vec![position.to_string()];
  for candidate in ALL_POSITIONS {
    if *candidate != position && position::includes(position, candidate) {
      out.push(candidate.to_string());
    }
  }
  out
}

/// A position plus everything its region conclusively excludes.
fn position_excludes(position: &str) -> Vec<String> {
  let mut out = vec![position.to_string()];
  for candidate in ALL_POSITIONS {
    if *candidate != position && position::excludes(position, candidate) {
      out.push(candidate.to_string());
    }
  }
  out
}

/// Position labels the include/exclude expansion ranges over: canonical
/// regions plus the raw variants the annotations use.
const ALL_POSITIONS: &[&str] = &[
  "head",
  "face",
  "body",
  "hand",
  "thigh",
  "foot",
  "left hand",
  "right hand",
  "both hands",
  "hands",
  "wrist",
  "fingers",
  "chest",
  "back",
  "shoulder",
  "waist",
  "hair",
  "forehead",
  "ear",
  "mouth",
  "nose",
  "eyes",
  "chin",
  "lap",
  "knee",
  "left foot",
  "right foot",
  "feet",
];

#[cfg(test)]
mod tests {
  use personbench_core::{DetectResults, HoiRecord, ObjectRecord, PersonRecord, PictureRecord, Relationship};
  use vocab::SynonymDict;

  use super::*;

  fn store() -> SynonymStore {
    let mut hoi = SynonymDict::default();
    hoi.add_synonym("cup", "mug");
    hoi.add_synonym("grasping", "holding");
    SynonymStore::new(SynonymDict::default(), hoi, SynonymDict::default())
  }

  fn picture(name: &str, object: &str, pairs: &[(&str, &str)]) -> Picture {
    Picture::from_record(PictureRecord {
      image_path: format!("{}.jpg", name),
      detect_results: DetectResults::default(),
      persons: vec![PersonRecord {
        hoi: vec![HoiRecord {
          object: 0,
          relationship: Relationship {
            action: pairs.iter().map(|(p, a)| (p.to_string(), a.to_string())).collect(),
            negative_action: Vec::new(),
          },
          ..Default::default()
        }],
        ..Default::default()
      }],
      objects: vec![ObjectRecord {
        name: object.into(),
        possible_names: vec![object.into()],
        ..Default::default()
      }],
    })
  }

  fn terms(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn test_find_matches_object_synonym_expansion() {
    let owned = vec![picture("a", "mug", &[("hand", "holding")])];
    let pictures: Vec<&Picture> = owned.iter().collect();
    let generator = HoiFeatureGenerator {
      store: &store(),
      dataset_dir: Path::new("."),
    };

    let query = HoiQuery {
      objects: Some(terms(&["cup"])),
      ..Default::default()
    };
    assert_eq!(generator.find_matches(&pictures, &query, None), vec![0]);
  }

  #[test]
  fn test_find_matches_exclude_rejects_picture() {
    let owned = vec![
      picture("a", "cup", &[("hand", "holding")]),
      picture("b", "cup", &[("face", "drinking from")]),
    ];
    let pictures: Vec<&Picture> = owned.iter().collect();
    let generator = HoiFeatureGenerator {
      store: &store(),
      dataset_dir: Path::new("."),
    };

    let query = HoiQuery {
      objects: Some(terms(&["cup"])),
      exclude_positions: Some(terms(&["hand"])),
      ..Default::default()
    };
    assert_eq!(generator.find_matches(&pictures, &query, None), vec![1]);
  }

  #[test]
  fn test_find_matches_excludes_query_picture() {
    let owned = vec![picture("a", "cup", &[("hand", "holding")])];
    let pictures: Vec<&Picture> = owned.iter().collect();
    let generator = HoiFeatureGenerator {
      store: &store(),
      dataset_dir: Path::new("."),
    };
    let query = HoiQuery {
      objects: Some(terms(&["cup"])),
      ..Default::default()
    };
    assert!(generator.find_matches(&pictures, &query, Some(0)).is_empty());
  }

  #[test]
  fn test_hold_query_excludes_hand_positions() {
    // Asking for "holding at a different position" can never match a hand:
    // the rule forces hand positions into the exclusion set.
    let owned = vec![picture("a", "cup", &[("left hand", "holding")])];
    let pictures: Vec<&Picture> = owned.iter().collect();
    let generator = HoiFeatureGenerator {
      store: &store(),
      dataset_dir: Path::new("."),
    };
    let query = HoiQuery {
      objects: Some(terms(&["cup"])),
      actions: Some(terms(&["holding"])),
      ..Default::default()
    };
    assert!(generator.find_matches(&pictures, &query, None).is_empty());
  }

  #[test]
  fn test_hand_position_query_excludes_hold_actions() {
    let owned = vec![
      picture("a", "cup", &[("hand", "holding")]),
      picture("b", "cup", &[("hand", "washing")]),
    ];
    let pictures: Vec<&Picture> = owned.iter().collect();
    let generator = HoiFeatureGenerator {
      store: &store(),
      dataset_dir: Path::new("."),
    };
    // Position pinned to hand with no action constraint: hold-like actions
    // are excluded, so only the washing picture matches.
    let query = HoiQuery {
      positions: Some(terms(&["hand"])),
      ..Default::default()
    };
    assert_eq!(generator.find_matches(&pictures, &query, None), vec![1]);
  }

  #[test]
  fn test_generate_produces_contrast_question() {
    // "nose" simplifies to "face"; face's exclusion range is
    // {face, hand, thigh, foot}, so body and head count as genuinely
    // different positions for the same object and action.
    let owned = vec![
      picture("full", "cup", &[("nose", "touching")]),
      picture("pos1", "cup", &[("body", "touching")]),
      picture("pos2", "cup", &[("head", "touching")]),
      // Different object, same position and action.
      picture("obj", "ball", &[("face", "touching")]),
    ];
    let pictures: Vec<&Picture> = owned.iter().collect();
    let generator = HoiFeatureGenerator {
      store: &store(),
      dataset_dir: Path::new("/data"),
    };

    let questions = generator.generate(&pictures);
    assert!(!questions.is_empty());
    let q = questions
      .iter()
      .find_map(|q| match q {
        Question::MultiImageHoi {
          object,
          full,
          diff_object,
          diff_position,
          extra_type,
          ..
        } if object == "cup" && full.contains("full") => {
          Some((diff_object.clone(), diff_position.clone(), extra_type.clone()))
        }
        _ => None,
      })
      .expect("expected a question for the cup interaction");
    let (diff_object, diff_position, extra_type) = q;
    assert!(diff_object.contains("obj"));
    assert!(diff_position.contains("pos"));
    assert_eq!(extra_type, "position");
  }
}
