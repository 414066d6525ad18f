//! Clothing-feature groundwork.
//!
//! Selects pictures where clothing is prominent and indexes which pictures
//! carry which (color, name) combinations. The synonym vocabulary built
//! from these terms feeds the clothing dictionary population run; question
//! emission for this family rides on the mixed-feature generator.

use std::collections::BTreeMap;

use personbench_core::Picture;
use tracing::debug;

/// Minimum summed body-box share of the image.
const MIN_BODY_AREA_SUM: f64 = 0.3;

/// Picture indices by clothing color and name, both directions.
#[derive(Debug, Default)]
pub struct ClothingMaps {
  /// color → name → pictures wearing that combination.
  pub by_color: BTreeMap<String, BTreeMap<String, Vec<usize>>>,
  /// name → color → pictures wearing that combination.
  pub by_name: BTreeMap<String, BTreeMap<String, Vec<usize>>>,
}

impl ClothingMaps {
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.by_name.keys().map(String::as_str)
  }

  pub fn colors(&self) -> impl Iterator<Item = &str> {
    self.by_color.keys().map(String::as_str)
  }
}

/// Pictures with prominent bodies and at least one clothing annotation.
pub fn filter_pictures(pictures: &[Picture]) -> Vec<&Picture> {
  let filtered: Vec<&Picture> = pictures
    .iter()
    .filter(|picture| {
      let body_area_sum: f64 = picture.persons.iter().map(|p| p.body_area()).sum();
      let has_clothing = picture.persons.iter().any(|p| !p.clothing_list(false).is_empty());
      body_area_sum > MIN_BODY_AREA_SUM && has_clothing
    })
    .collect();
  debug!(total = pictures.len(), kept = filtered.len(), "Filtered pictures for clothing features");
  filtered
}

/// Index every (color, name) clothing combination across the pictures.
pub fn build_maps(pictures: &[&Picture]) -> ClothingMaps {
  let mut maps = ClothingMaps::default();
  for (idx, picture) in pictures.iter().enumerate() {
    for person in &picture.persons {
      for item in person.clothing_list(false) {
        for color in &item.color {
          maps
            .by_color
            .entry(color.clone())
            .or_default()
            .entry(item.name.clone())
            .or_default()
            .push(idx);
          maps
            .by_name
            .entry(item.name.clone())
            .or_default()
            .entry(color.clone())
            .or_default()
            .push(idx);
        }
      }
    }
  }
  debug!(
    names = maps.by_name.len(),
    colors = maps.by_color.len(),
    "Constructed clothing maps"
  );
  maps
}

#[cfg(test)]
mod tests {
  use personbench_core::{
    BoundingBox, DetectResults, PersonRecord, PictureRecord, QwenDetailing,
    schema::{ClothingField, ClothingItem},
  };

  use super::*;

  fn picture(body: Option<[f64; 4]>, clothing: &[(&str, &[&str])]) -> Picture {
    let items = clothing
      .iter()
      .map(|(name, colors)| ClothingItem {
        name: name.to_string(),
        color: colors.iter().map(|c| c.to_string()).collect(),
        kind: None,
        belonging_confident: true,
        existence_confident: true,
      })
      .collect();
    Picture::from_record(PictureRecord {
      image_path: "img.jpg".into(),
      detect_results: DetectResults {
        body_boxes: body.iter().map(|b| BoundingBox::from(*b)).collect(),
        ..Default::default()
      },
      persons: vec![PersonRecord {
        body_box: body.map(|_| 0),
        qwen_detailing: QwenDetailing {
          clothing: ClothingField::List(items),
          ..Default::default()
        },
        ..Default::default()
      }],
      ..Default::default()
    })
  }

  #[test]
  fn test_filter_requires_prominent_bodies_and_clothing() {
    let prominent = picture(Some([0.0, 0.0, 0.7, 0.7]), &[("jacket", &["red"])]);
    let tiny = picture(Some([0.0, 0.0, 0.1, 0.1]), &[("jacket", &["red"])]);
    let naked = picture(Some([0.0, 0.0, 0.7, 0.7]), &[]);
    let pictures = vec![prominent, tiny, naked];

    let kept = filter_pictures(&pictures);
    assert_eq!(kept.len(), 1);
  }

  #[test]
  fn test_build_maps_both_directions() {
    let owned = vec![
      picture(Some([0.0, 0.0, 0.7, 0.7]), &[("jacket", &["red", "black"])]),
      picture(Some([0.0, 0.0, 0.7, 0.7]), &[("jacket", &["red"]), ("scarf", &["red"])]),
    ];
    let pictures: Vec<&Picture> = owned.iter().collect();
    let maps = build_maps(&pictures);

    assert_eq!(maps.by_name["jacket"]["red"], vec![0, 1]);
    assert_eq!(maps.by_name["jacket"]["black"], vec![0]);
    assert_eq!(maps.by_color["red"]["scarf"], vec![1]);

    let names: Vec<&str> = maps.names().collect();
    assert_eq!(names, vec!["jacket", "scarf"]);
    let colors: Vec<&str> = maps.colors().collect();
    assert_eq!(colors, vec!["black", "red"]);
  }
}
