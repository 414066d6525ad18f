//! Mixed-feature questions over multi-person pictures.
//!
//! For every person, up to six questions are attempted from their unique
//! feature set (grounding, fill-blank, multiple choice, a true/false that is
//! actually true, a true/false that is actually false, and an open HOI
//! grounding), plus one per-picture question about the feature everyone
//! shares. Every attempt is a pure function returning `Option<Question>`;
//! a combination that does not apply is skipped, never an error.

use std::collections::BTreeSet;
use std::path::Path;

use algebra::{AttrKind, AttrValue, ExtractOptions, Observation, resolve};
use personbench_core::Picture;
use rand::rngs::StdRng;
use tracing::warn;
use vocab::SynonymStore;

use crate::framework::Question;
use crate::sampler::{choices, choose, sample};

/// Slot names eligible as fill-blank answers.
const FILL_BLANK_NAMES: [&str; 8] = ["pitch", "yaw", "gender", "age", "race", "emotion", "clothing", "hoi"];

pub struct MixedFeatureGenerator<'a> {
  pub store: &'a SynonymStore,
  pub dataset_dir: &'a Path,
}

impl MixedFeatureGenerator<'_> {
  /// Pictures with more than one person, all of them with body boxes.
  pub fn filter_pictures<'p>(&self, pictures: &'p [Picture]) -> Vec<&'p Picture> {
    pictures
      .iter()
      .filter(|p| p.persons.len() > 1 && p.persons.iter().all(|person| person.body_box.is_some()))
      .collect()
  }

  pub fn generate(&self, pictures: &[&Picture], rng: &mut StdRng) -> Vec<Question> {
    let mut questions = Vec::new();
    for picture in pictures {
      let features = match resolve(picture, self.store, ExtractOptions::default()) {
        Ok(features) => features,
        Err(e) => {
          warn!(image = picture.image_file_name(), err = %e, "Skipping picture with malformed annotations");
          continue;
        }
      };
      let image = picture.image_path(self.dataset_dir).to_string_lossy().into_owned();

      let mut all_conditions: Vec<Observation> = Vec::new();
      for purified in &features.unique {
        all_conditions.extend(purified.conditions.iter().cloned());
      }

      for (i, person) in picture.persons.iter().enumerate() {
        let true_conds = &features.unique[i].conditions;
        let ans_feats = &features.unique[i].answers;
        let false_conds: Vec<Observation> = features
          .unique
          .iter()
          .enumerate()
          .filter(|(j, _)| *j != i)
          .flat_map(|(_, p)| p.conditions.iter().cloned())
          .collect();

        let bbox_ans: Vec<Observation> = ans_feats.iter().filter(|o| o.kind() == AttrKind::Bbox).cloned().collect();
        let suitable_blank: Vec<Observation> = ans_feats
          .iter()
          .filter(|o| {
            matches!(
              o.kind(),
              AttrKind::Facial | AttrKind::Overall | AttrKind::Clothing | AttrKind::Hoi
            ) && FILL_BLANK_NAMES.contains(&o.name.as_str())
          })
          .cloned()
          .collect();
        let can_mutate = !person.hand_cant_swap();

        questions.extend(attempt_grounding(rng, &bbox_ans, true_conds, &image));
        questions.extend(attempt_blank(rng, &suitable_blank, true_conds, &image, can_mutate));
        questions.extend(attempt_choice(rng, true_conds, &false_conds, &image));
        questions.extend(attempt_tf_true(
          rng,
          true_conds,
          &features.shared,
          &bbox_ans,
          &suitable_blank,
          &image,
          can_mutate,
        ));
        questions.extend(attempt_tf_false(
          rng,
          true_conds,
          &features.shared,
          &false_conds,
          &bbox_ans,
          &suitable_blank,
          &image,
        ));
        questions.extend(attempt_open_grounding(rng, true_conds, &image));
      }

      questions.extend(attempt_common_choice(rng, &features.shared, &all_conditions, &image));
    }
    questions
  }
}

fn attempt_grounding(
  rng: &mut StdRng,
  bbox_ans: &[Observation],
  true_conds: &[Observation],
  image: &str,
) -> Option<Question> {
  let answer = choose(rng, bbox_ans)?;
  let different: Vec<&Observation> = true_conds.iter().filter(|f| *f != answer).collect();
  let condition = choose(rng, &different)?;
  Some(Question::Grounding {
    condition: (*condition).clone(),
    question: answer.clone(),
    image: image.to_string(),
  })
}

fn attempt_blank(
  rng: &mut StdRng,
  suitable: &[Observation],
  true_conds: &[Observation],
  image: &str,
  can_mutate: bool,
) -> Option<Question> {
  let blank = choose(rng, suitable)?;
  let pool = remove_same_place_features(true_conds, &[blank]);
  let condition = choose(rng, &pool)?;
  Some(Question::Blank {
    condition: condition.clone(),
    question: blank.clone(),
    image: image.to_string(),
    can_mutate_hand_to_false: can_mutate,
  })
}

fn attempt_choice(
  rng: &mut StdRng,
  true_conds: &[Observation],
  false_conds: &[Observation],
  image: &str,
) -> Option<Question> {
  let condition = choose(rng, true_conds)?;
  let possible: Vec<&Observation> = true_conds
    .iter()
    .filter(|f| *f != condition && f.kind() != AttrKind::Bbox)
    .collect();
  let answer = choose(rng, &possible)?;
  let pool = remove_same_place_features(false_conds, &[condition]);
  let false_answers = sample(rng, &pool, 3)?;
  Some(Question::Choice {
    condition: condition.clone(),
    image: image.to_string(),
    true_answer: (*answer).clone(),
    false_answers: false_answers.into_iter().cloned().collect(),
  })
}

/// Two true conditions (preferring one shared by everyone as the second)
/// plus a real answer: verifies as true.
fn attempt_tf_true(
  rng: &mut StdRng,
  true_conds: &[Observation],
  shared: &[Observation],
  bbox_ans: &[Observation],
  suitable: &[Observation],
  image: &str,
  can_mutate: bool,
) -> Option<Question> {
  let pool1: Vec<&Observation> = true_conds
    .iter()
    .filter(|f| !shared.contains(f) && f.kind() != AttrKind::Bbox)
    .collect();
  let condition_1 = *choose(rng, &pool1)?;

  let shared_pool: Vec<&Observation> = shared
    .iter()
    .filter(|f| *f != condition_1 && f.kind() != AttrKind::Bbox)
    .collect();
  let condition_2 = if !shared_pool.is_empty() {
    *choose(rng, &shared_pool)?
  } else {
    let fallback: Vec<&Observation> = true_conds
      .iter()
      .filter(|f| *f != condition_1 && f.kind() != AttrKind::Bbox)
      .collect();
    *choose(rng, &fallback)?
  };

  let (answer, grounding) = if !bbox_ans.is_empty() {
    let pool: Vec<&Observation> = bbox_ans
      .iter()
      .filter(|f| *f != condition_1 && *f != condition_2)
      .collect();
    (*choose(rng, &pool)?, true)
  } else {
    let pool: Vec<&Observation> = suitable
      .iter()
      .filter(|f| *f != condition_1 && *f != condition_2)
      .collect();
    (*choose(rng, &pool)?, false)
  };

  let question = if grounding {
    Question::TfGrounding {
      condition_1: condition_1.clone(),
      condition_2: condition_2.clone(),
      answer: Some(answer.clone()),
      fake_answer: None,
      image: image.to_string(),
      can_mutate_hand_to_false: Some(can_mutate),
    }
  } else {
    Question::TfBlank {
      condition_1: condition_1.clone(),
      condition_2: condition_2.clone(),
      answer: Some(answer.clone()),
      fake_answer: None,
      image: image.to_string(),
      can_mutate_hand_to_false: Some(can_mutate),
    }
  };
  Some(question)
}

/// One condition true of this person, one true of somebody else: the
/// combined statement verifies as false. The answer slot only keeps the
/// template fillable.
fn attempt_tf_false(
  rng: &mut StdRng,
  true_conds: &[Observation],
  shared: &[Observation],
  false_conds: &[Observation],
  bbox_ans: &[Observation],
  suitable: &[Observation],
  image: &str,
) -> Option<Question> {
  let full_box_or_not_bbox =
    |f: &Observation| f.kind() != AttrKind::Bbox || matches!(f.name.as_str(), "face" | "body");

  let pool1: Vec<&Observation> = true_conds
    .iter()
    .filter(|f| !shared.contains(f) && full_box_or_not_bbox(f))
    .collect();
  let condition_1 = *choose(rng, &pool1)?;

  let pool2_base = remove_same_place_features(false_conds, &[condition_1]);
  let pool2: Vec<&Observation> = pool2_base
    .iter()
    .filter(|f| *f != condition_1 && full_box_or_not_bbox(f))
    .collect();
  let condition_2 = (*choose(rng, &pool2)?).clone();

  let bbox_pool = remove_same_place_features(bbox_ans, &[condition_1, &condition_2]);
  let (fake_answer, grounding) = if !bbox_pool.is_empty() {
    (choose(rng, &bbox_pool)?.clone(), true)
  } else {
    let blank_pool = remove_same_place_features(suitable, &[&condition_2, condition_1]);
    (choose(rng, &blank_pool)?.clone(), false)
  };

  let question = if grounding {
    Question::TfGrounding {
      condition_1: condition_1.clone(),
      condition_2,
      answer: None,
      fake_answer: Some(fake_answer),
      image: image.to_string(),
      can_mutate_hand_to_false: None,
    }
  } else {
    Question::TfBlank {
      condition_1: condition_1.clone(),
      condition_2,
      answer: None,
      fake_answer: Some(fake_answer),
      image: image.to_string(),
      can_mutate_hand_to_false: None,
    }
  };
  Some(question)
}

fn attempt_open_grounding(rng: &mut StdRng, true_conds: &[Observation], image: &str) -> Option<Question> {
  let hoi_pool: Vec<&Observation> = true_conds.iter().filter(|f| f.kind() == AttrKind::Hoi).collect();
  let answer = *choose(rng, &hoi_pool)?;
  let cond_pool: Vec<&Observation> = true_conds
    .iter()
    .filter(|f| *f != answer && (f.kind() != AttrKind::Bbox || matches!(f.name.as_str(), "face" | "body")))
    .collect();
  let condition = choose(rng, &cond_pool)?;
  Some(Question::OpenGrounding {
    condition: (*condition).clone(),
    answer: answer.clone(),
    image: image.to_string(),
  })
}

fn attempt_common_choice(
  rng: &mut StdRng,
  shared: &[Observation],
  all_conditions: &[Observation],
  image: &str,
) -> Option<Question> {
  let answer = choose(rng, shared)?;
  let pool: Vec<&Observation> = all_conditions.iter().filter(|f| *f != answer).collect();
  let false_answers = choices(rng, &pool, 3)?;
  Some(Question::CommonChoice {
    true_answer: answer.clone(),
    false_answers: false_answers.into_iter().map(|f| (*f).clone()).collect(),
    image: image.to_string(),
  })
}

/// Drop features that would describe the same place or slot as one of the
/// already-`provided` features: the clothing wear-position, any shared HOI
/// position, the same bbox slot, the same overall slot, or the provided
/// features themselves. Keeps conditions and answers from talking about the
/// same thing twice.
pub fn remove_same_place_features(features: &[Observation], provided: &[&Observation]) -> Vec<Observation> {
  let mut seen_positions: BTreeSet<String> = BTreeSet::new();
  let mut seen_bbox: BTreeSet<&str> = BTreeSet::new();
  let mut seen_overall: BTreeSet<&str> = BTreeSet::new();
  for f in provided {
    match &f.value {
      AttrValue::Clothing(c) => {
        if let Some(kind) = &c.kind {
          seen_positions.insert(kind.clone());
        }
      }
      AttrValue::Hoi(h) => {
        for (pos, _) in &h.relation {
          seen_positions.insert(pos.clone());
        }
      }
      AttrValue::Box(_) => {
        seen_bbox.insert(f.name.as_str());
      }
      AttrValue::Choice(_) => {
        seen_overall.insert(f.name.as_str());
      }
      AttrValue::Flag(_) | AttrValue::Pose(_) | AttrValue::Text(_) => {}
    }
  }

  features
    .iter()
    .filter(|f| {
      if provided.contains(f) {
        return false;
      }
      match &f.value {
        AttrValue::Clothing(c) => c.kind.as_ref().is_none_or(|kind| !seen_positions.contains(kind)),
        AttrValue::Hoi(h) => h.relation.iter().all(|(pos, _)| !seen_positions.contains(pos)),
        AttrValue::Box(_) => !seen_bbox.contains(f.name.as_str()),
        AttrValue::Choice(_) => !seen_overall.contains(f.name.as_str()),
        AttrValue::Flag(_) | AttrValue::Pose(_) | AttrValue::Text(_) => true,
      }
    })
    .cloned()
    .collect()
}
