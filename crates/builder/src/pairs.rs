//! Candidate term-pair enumeration for dictionary population.

use std::collections::BTreeSet;

use personbench_core::Picture;
use vocab::SynonymDict;

/// What the two terms of a pair describe; drives the oracle phrasing and
/// the cheap prefilters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
  ClothingName,
  ClothingColor,
  HoiObject,
  HoiAction,
  Wearable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePair {
  pub a: String,
  pub b: String,
  pub kind: TermKind,
}

/// HOI vocabulary terms over the dataset: object names (including aliases)
/// and actions (including annotated negative actions).
pub fn collect_hoi_terms(pictures: &[&Picture]) -> (BTreeSet<String>, BTreeSet<String>) {
  let mut objects = BTreeSet::new();
  let mut actions = BTreeSet::new();
  for picture in pictures {
    for person in &picture.persons {
      for hoi in &person.hois {
        objects.insert(hoi.object_name().to_string());
        objects.extend(hoi.object_names().map(str::to_string));
        actions.extend(hoi.actions().iter().map(|a| a.to_string()));
        actions.extend(hoi.negative_actions().iter().cloned());
      }
    }
    for object in picture.hoi_objects.iter().flatten() {
      objects.extend(object.possible_names.iter().cloned());
    }
  }
  (objects, actions)
}


/// All unordered pairs over `terms` not already adjudicated in `dict`.
/// The skip makes interrupted population runs resumable: a pair whose both
/// terms appear in either map was handled by an earlier run.
pub fn enumerate_pairs(terms: &BTreeSet<String>, kind: TermKind, dict: &SynonymDict) -> Vec<CandidatePair> {
  let ordered: Vec<&String> = terms.iter().collect();
  let mut pairs = Vec::new();
  for (i, a) in ordered.iter().enumerate() {
    for b in &ordered[i + 1..] {
      if dict.pair_known(a, b) {
        continue;
      }
      pairs.push(CandidatePair {
        a: (*a).clone(),
        b: (*b).clone(),
        kind,
      });
    }
  }
  pairs
}

#[cfg(test)]
mod tests {
  use super::*;

  fn terms(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn test_enumerate_all_unordered_pairs() {
    let pairs = enumerate_pairs(&terms(&["a", "b", "c"]), TermKind::HoiAction, &SynonymDict::default());
    assert_eq!(pairs.len(), 3);
    assert!(pairs.iter().all(|p| p.a < p.b));
  }

  #[test]
  fn test_enumerate_skips_known_pairs() {
    let mut dict = SynonymDict::default();
    dict.add_synonym("a", "b");
    let pairs = enumerate_pairs(&terms(&["a", "b", "c"]), TermKind::ClothingName, &dict);
    // a-b is known; a-c and b-c survive even though a and b have entries,
    // because c is new to the dictionary.
    assert_eq!(pairs.len(), 2);
    assert!(pairs.iter().all(|p| p.b == "c"));
  }
}
