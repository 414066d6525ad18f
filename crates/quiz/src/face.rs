//! Multi-image face-feature questions.
//!
//! For every 3-combination of facial attributes, the dataset is bucketed
//! into cohorts: a picture where someone satisfies all three (fullfit),
//! exactly two (duo), exactly one (solo), and pictures where everyone
//! denies all three (none). One question pairs one picture from each
//! cohort; cohorts are ranked so rarely used, confidently annotated
//! pictures come first.

use std::collections::BTreeSet;
use std::path::Path;

use personbench_core::{FACE_ATTR_NAMES, Person, Picture};
use tracing::debug;

use crate::framework::{OccurrenceTracker, Question};

/// Minimum face-box share of the image for a person to count.
const MIN_FACE_AREA: f64 = 0.03;

/// Cohort size cap per attribute combination.
const MAX_COHORT: usize = 10;

pub struct FaceFeatureGenerator<'a> {
  pub dataset_dir: &'a Path,
}

/// A picture qualifying for a cohort with the attribute subsets that made
/// it qualify.
struct CohortEntry {
  picture: usize,
  admit: BTreeSet<String>,
  deny: BTreeSet<String>,
}

impl FaceFeatureGenerator<'_> {
  /// A picture qualifies when someone's face covers enough of the image
  /// and no foreground person with a visible face falls below the size
  /// cutoff (small readable faces would make the question ambiguous).
  pub fn filter_pictures<'p>(&self, pictures: &'p [Picture]) -> Vec<&'p Picture> {
    let filtered: Vec<&Picture> = pictures
      .iter()
      .filter(|picture| {
        let has_large_face = picture.persons.iter().any(|p| p.face_area() > MIN_FACE_AREA);
        let has_small_foreground_face = picture
          .persons
          .iter()
          .any(|p| p.face_area() < MIN_FACE_AREA && p.face_seen() && !p.background());
        has_large_face && !has_small_foreground_face
      })
      .collect();
    debug!(total = pictures.len(), kept = filtered.len(), "Filtered pictures for face questions");
    filtered
  }

  pub fn generate(&self, pictures: &[&Picture]) -> Vec<Question> {
    let mut questions = Vec::new();
    let mut occurrence = OccurrenceTracker::new();

    for combo in combinations_of_three(&FACE_ATTR_NAMES) {
      let fullfit = self.find_fullfit(pictures, &combo, &mut occurrence);
      if fullfit.is_empty() {
        continue;
      }
      let duo = self.find_partial(pictures, &combo, 2, &mut occurrence);
      let solo = self.find_partial(pictures, &combo, 1, &mut occurrence);
      let none = self.find_none(pictures, &combo, &mut occurrence);
      if duo.is_empty() || solo.is_empty() || none.is_empty() {
        continue;
      }

      let fullfit = rank_and_cap(fullfit, pictures, &occurrence, MAX_COHORT);
      let target = fullfit.len();
      let duo = rank_and_cycle(duo, pictures, &occurrence, target);
      let solo = rank_and_cycle(solo, pictures, &occurrence, target);
      let none = rank_and_cycle(none, pictures, &occurrence, target);

      for i in 0..target {
        questions.push(Question::MultiFaceFeature {
          combine: combo.iter().map(|s| s.to_string()).collect(),
          fullfit: self.image(pictures, fullfit[i].picture),
          duo: self.image(pictures, duo[i].picture),
          duo_admit: duo[i].admit.iter().cloned().collect(),
          solo: self.image(pictures, solo[i].picture),
          solo_admit: solo[i].admit.iter().cloned().collect(),
          none: self.image(pictures, none[i].picture),
        });
      }
    }
    questions
  }

  fn image(&self, pictures: &[&Picture], idx: usize) -> String {
    pictures[idx].image_path(self.dataset_dir).to_string_lossy().into_owned()
  }

  /// Pictures where one large-faced person admits all three attributes.
  fn find_fullfit(&self, pictures: &[&Picture], combo: &[&str; 3], occurrence: &mut OccurrenceTracker) -> Vec<CohortEntry> {
    let mut found = Vec::new();
    for (idx, picture) in pictures.iter().enumerate() {
      let hit = eligible_persons(picture).any(|person| {
        combo.iter().all(|attr| person.face_attr_admit_set().contains(*attr))
      });
      if hit {
        occurrence.bump(idx);
        found.push(CohortEntry {
          picture: idx,
          admit: combo.iter().map(|s| s.to_string()).collect(),
          deny: BTreeSet::new(),
        });
      }
    }
    found
  }

  /// Pictures where one large-faced person admits exactly `admit_count` of
  /// the three and denies the rest, and every other large-faced person
  /// denies the denied attributes too (otherwise the picture would also
  /// answer a stronger bucket).
  fn find_partial(
    &self,
    pictures: &[&Picture],
    combo: &[&str; 3],
    admit_count: usize,
    occurrence: &mut OccurrenceTracker,
  ) -> Vec<CohortEntry> {
    let mut found = Vec::new();
    for (idx, picture) in pictures.iter().enumerate() {
      let mut entry: Option<(BTreeSet<String>, BTreeSet<String>)> = None;
      for person in eligible_persons(picture) {
        let mut admitted = BTreeSet::new();
        let mut denied = BTreeSet::new();
        for attr in combo {
          if person.face_attr_admit_set().contains(*attr) {
            admitted.insert(attr.to_string());
          } else if person.face_attr_deny_set().contains(*attr) {
            denied.insert(attr.to_string());
          }
        }
        if admitted.len() != admit_count || admitted.len() + denied.len() != combo.len() {
          continue;
        }
        let others_deny = eligible_persons(picture)
          .filter(|other| !std::ptr::eq(*other, person))
          .all(|other| denied.iter().all(|d| !other.face_attr_admit_set().contains(d)));
        if others_deny {
          entry = Some((admitted, denied));
          break;
        }
      }
      if let Some((admit, deny)) = entry {
        occurrence.bump(idx);
        found.push(CohortEntry {
          picture: idx,
          admit,
          deny,
        });
      }
    }
    found
  }

  /// Pictures where every large-faced person denies all three attributes.
  fn find_none(&self, pictures: &[&Picture], combo: &[&str; 3], occurrence: &mut OccurrenceTracker) -> Vec<CohortEntry> {
    let mut found = Vec::new();
    for (idx, picture) in pictures.iter().enumerate() {
      let mut any_eligible = false;
      let all_deny = eligible_persons(picture).all(|person| {
        any_eligible = true;
        combo.iter().all(|attr| person.face_attr_deny_set().contains(*attr))
      });
      if any_eligible && all_deny {
        occurrence.bump(idx);
        found.push(CohortEntry {
          picture: idx,
          admit: BTreeSet::new(),
          deny: combo.iter().map(|s| s.to_string()).collect(),
        });
      }
    }
    found
  }
}

fn eligible_persons(picture: &Picture) -> impl Iterator<Item = &Person> {
  picture
    .persons
    .iter()
    .filter(|p| p.face_box.is_some() && p.face_area() > MIN_FACE_AREA)
}

/// A picture pays for being used often and for weak model confidence in the
/// asserted/denied attributes; lower is better.
fn penalty(entry: &CohortEntry, pictures: &[&Picture], occurrence: &OccurrenceTracker) -> f64 {
  let picture = pictures[entry.picture];
  let confidence = picture
    .persons
    .iter()
    .map(|person| {
      person.face_attr_assert_belief(
        entry.admit.iter().map(String::as_str),
        entry.deny.iter().map(String::as_str),
      )
    })
    .fold(0.0f64, f64::max);
  occurrence.get(entry.picture) as f64 * (1.0 - confidence)
}

fn rank_and_cap(
  mut entries: Vec<CohortEntry>,
  pictures: &[&Picture],
  occurrence: &OccurrenceTracker,
  cap: usize,
) -> Vec<CohortEntry> {
  entries.sort_by(|a, b| {
    penalty(a, pictures, occurrence)
      .partial_cmp(&penalty(b, pictures, occurrence))
      .unwrap_or(std::cmp::Ordering::Equal)
  });
  entries.truncate(cap);
  entries
}

/// Rank like [`rank_and_cap`], then repeat entries cyclically up to exactly
/// `target` so the cohorts zip one-to-one.
fn rank_and_cycle(
  entries: Vec<CohortEntry>,
  pictures: &[&Picture],
  occurrence: &OccurrenceTracker,
  target: usize,
) -> Vec<CohortEntry> {
  let ranked = rank_and_cap(entries, pictures, occurrence, usize::MAX);
  let mut out = Vec::with_capacity(target);
  let mut i = 0;
  while out.len() < target {
    let src = &ranked[i % ranked.len()];
    out.push(CohortEntry {
      picture: src.picture,
      admit: src.admit.clone(),
      deny: src.deny.clone(),
    });
    i += 1;
  }
  out
}

/// Ordered 3-combinations of the attribute vocabulary.
fn combinations_of_three(names: &[&'static str]) -> Vec<[&'static str; 3]> {
  let mut combos = Vec::new();
  for i in 0..names.len() {
    for j in i + 1..names.len() {
      for k in j + 1..names.len() {
        combos.push([names[i], names[j], names[k]]);
      }
    }
  }
  combos
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use personbench_core::{DetectResults, FacexDetailing, PersonRecord, PictureRecord, QwenDetailing};

  use super::*;

  fn picture_with_faces(confidences: &[&[(&str, f64)]]) -> Picture {
    let face_boxes = confidences
      .iter()
      .map(|_| personbench_core::BoundingBox::new(0.1, 0.1, 0.4, 0.4))
      .collect();
    let persons = confidences
      .iter()
      .enumerate()
      .map(|(i, attrs)| {
        let attributes: BTreeMap<String, f64> = attrs.iter().map(|(n, c)| (n.to_string(), *c)).collect();
        PersonRecord {
          face_box: Some(i),
          facex_detailing: Some(FacexDetailing {
            attributes,
            ..Default::default()
          }),
          qwen_detailing: QwenDetailing::default(),
          ..Default::default()
        }
      })
      .collect();
    Picture::from_record(PictureRecord {
      image_path: "img.jpg".into(),
      detect_results: DetectResults {
        face_boxes,
        ..Default::default()
      },
      persons,
      ..Default::default()
    })
  }

  #[test]
  fn test_combinations_count() {
    let combos = combinations_of_three(&["a", "b", "c", "d"]);
    assert_eq!(combos.len(), 4);
  }

  #[test]
  fn test_filter_requires_large_face() {
    let generator = FaceFeatureGenerator {
      dataset_dir: Path::new("."),
    };
    // 0.3 x 0.3 face box: area 0.09 > 0.03.
    let big = picture_with_faces(&[&[("Male", 0.99)]]);
    let none = Picture::from_record(PictureRecord::default());
    let pictures = vec![big, none];
    let kept = generator.filter_pictures(&pictures);
    assert_eq!(kept.len(), 1);
  }

  #[test]
  fn test_fullfit_detection() {
    let generator = FaceFeatureGenerator {
      dataset_dir: Path::new("."),
    };
    // Admits Male (>= 0.98), Smiling (>= 0.80), Young (>= 0.98).
    let picture = picture_with_faces(&[&[("Male", 0.99), ("Smiling", 0.9), ("Young", 0.99)]]);
    let pictures: Vec<&Picture> = vec![&picture];
    let mut occurrence = OccurrenceTracker::new();
    let combo = ["Male", "Smiling", "Young"];
    let found = generator.find_fullfit(&pictures, &combo, &mut occurrence);
    assert_eq!(found.len(), 1);
    assert_eq!(occurrence.get(0), 1);
  }

  #[test]
  fn test_partial_detection_duo() {
    let generator = FaceFeatureGenerator {
      dataset_dir: Path::new("."),
    };
    // Admits Male and Smiling, below admit for Young.
    let picture = picture_with_faces(&[&[("Male", 0.99), ("Smiling", 0.9), ("Young", 0.1)]]);
    let pictures: Vec<&Picture> = vec![&picture];
    let mut occurrence = OccurrenceTracker::new();
    let combo = ["Male", "Smiling", "Young"];

    let duo = generator.find_partial(&pictures, &combo, 2, &mut occurrence);
    assert_eq!(duo.len(), 1);
    assert_eq!(duo[0].admit.len(), 2);
    assert!(duo[0].deny.contains("Young"));

    let solo = generator.find_partial(&pictures, &combo, 1, &mut occurrence);
    assert!(solo.is_empty());
  }

  #[test]
  fn test_none_detection() {
    let generator = FaceFeatureGenerator {
      dataset_dir: Path::new("."),
    };
    let picture = picture_with_faces(&[&[("Male", 0.1), ("Smiling", 0.1), ("Young", 0.1)]]);
    let pictures: Vec<&Picture> = vec![&picture];
    let mut occurrence = OccurrenceTracker::new();
    let combo = ["Male", "Smiling", "Young"];
    let found = generator.find_none(&pictures, &combo, &mut occurrence);
    assert_eq!(found.len(), 1);
  }

  #[test]
  fn test_rank_and_cycle_repeats_to_target() {
    let picture = picture_with_faces(&[&[("Male", 0.99)]]);
    let pictures: Vec<&Picture> = vec![&picture];
    let occurrence = OccurrenceTracker::new();
    let entries = vec![CohortEntry {
      picture: 0,
      admit: BTreeSet::new(),
      deny: BTreeSet::new(),
    }];
    let cycled = rank_and_cycle(entries, &pictures, &occurrence, 3);
    assert_eq!(cycled.len(), 3);
    assert!(cycled.iter().all(|e| e.picture == 0));
  }

  #[test]
  fn test_generate_emits_question_per_zip_slot() {
    let generator = FaceFeatureGenerator {
      dataset_dir: Path::new("/data"),
    };
    let fullfit = picture_with_faces(&[&[("Male", 0.99), ("Smiling", 0.9), ("Young", 0.99)]]);
    let duo = picture_with_faces(&[&[("Male", 0.99), ("Smiling", 0.9), ("Young", 0.1)]]);
    let solo = picture_with_faces(&[&[("Male", 0.99), ("Smiling", 0.1), ("Young", 0.1)]]);
    let nothing = picture_with_faces(&[&[("Male", 0.1), ("Smiling", 0.1), ("Young", 0.1)]]);
    let owned = vec![fullfit, duo, solo, nothing];
    let pictures: Vec<&Picture> = owned.iter().collect();

    let questions = generator.generate(&pictures);
    // At least the (Male, Smiling, Young) combination produces questions.
    assert!(!questions.is_empty());
    let male_smiling_young = questions.iter().any(|q| match q {
      Question::MultiFaceFeature { combine, .. } => {
        combine.contains(&"Male".to_string())
          && combine.contains(&"Smiling".to_string())
          && combine.contains(&"Young".to_string())
      }
      _ => false,
    });
    assert!(male_smiling_young);
  }
}
