//! Bounding-box geometry over normalized image coordinates.
//!
//! All boxes live in `[0, 1] × [0, 1]` with the whole image having area 1,
//! so areas double as fraction-of-image measures.

use serde::{Deserialize, Serialize};

/// Axis-aligned box `(x1, y1, x2, y2)` in normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
  pub x1: f64,
  pub y1: f64,
  pub x2: f64,
  pub y2: f64,
}

impl From<[f64; 4]> for BoundingBox {
  fn from(v: [f64; 4]) -> Self {
    Self {
      x1: v[0],
      y1: v[1],
      x2: v[2],
      y2: v[3],
    }
  }
}

impl From<BoundingBox> for [f64; 4] {
  fn from(b: BoundingBox) -> Self {
    [b.x1, b.y1, b.x2, b.y2]
  }
}

impl BoundingBox {
  pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
    Self { x1, y1, x2, y2 }
  }

  pub fn area(&self) -> f64 {
    (self.x2 - self.x1) * (self.y2 - self.y1)
  }

  /// Intersection over union. Degenerate boxes and empty overlaps yield 0.
  pub fn iou(&self, other: &BoundingBox) -> f64 {
    let x1 = self.x1.max(other.x1);
    let y1 = self.y1.max(other.y1);
    let x2 = self.x2.min(other.x2);
    let y2 = self.y2.min(other.y2);
    if x1 < x2 && y1 < y2 {
      let intersection = (x2 - x1) * (y2 - y1);
      let union = self.area() + other.area() - intersection;
      if union > 0.0 { intersection / union } else { 0.0 }
    } else {
      0.0
    }
  }

  /// Tight box around a set of key points, ignoring `(-1, -1)` sentinels
  /// (undetected points), clamped to the unit square. `None` when every
  /// point is a sentinel.
  pub fn from_key_points(points: &[[f64; 2]]) -> Option<BoundingBox> {
    let mut x_min = f64::INFINITY;
    let mut y_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for p in points {
      if p[0] != -1.0 {
        x_min = x_min.min(p[0]);
        x_max = x_max.max(p[0]);
      }
      if p[1] != -1.0 {
        y_min = y_min.min(p[1]);
        y_max = y_max.max(p[1]);
      }
    }
    if !x_min.is_finite() || !y_min.is_finite() {
      return None;
    }
    Some(BoundingBox {
      x1: x_min.max(0.0),
      y1: y_min.max(0.0),
      x2: x_max.min(1.0),
      y2: y_max.min(1.0),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_iou_identical() {
    let b = BoundingBox::new(0.1, 0.1, 0.5, 0.5);
    assert!((b.iou(&b) - 1.0).abs() < 1e-9);
  }

  #[test]
  fn test_iou_disjoint() {
    let a = BoundingBox::new(0.0, 0.0, 0.2, 0.2);
    let b = BoundingBox::new(0.5, 0.5, 0.8, 0.8);
    assert_eq!(a.iou(&b), 0.0);
  }

  #[test]
  fn test_iou_touching_edges_is_zero() {
    let a = BoundingBox::new(0.0, 0.0, 0.5, 0.5);
    let b = BoundingBox::new(0.5, 0.0, 1.0, 0.5);
    assert_eq!(a.iou(&b), 0.0);
  }

  #[test]
  fn test_iou_half_overlap() {
    // Two unit-quarter boxes sharing half their area: IoU = 1/3
    let a = BoundingBox::new(0.0, 0.0, 0.4, 0.4);
    let b = BoundingBox::new(0.2, 0.0, 0.6, 0.4);
    assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-9);
  }

  #[test]
  fn test_key_points_ignores_sentinels() {
    let points = [[0.2, 0.3], [-1.0, -1.0], [0.4, 0.1]];
    let b = BoundingBox::from_key_points(&points).unwrap();
    assert_eq!(b, BoundingBox::new(0.2, 0.1, 0.4, 0.3));
  }

  #[test]
  fn test_key_points_all_sentinels() {
    let points = [[-1.0, -1.0], [-1.0, -1.0]];
    assert!(BoundingBox::from_key_points(&points).is_none());
  }

  #[test]
  fn test_key_points_clamped_to_unit_square() {
    let points = [[-0.2, 0.5], [1.3, 1.1]];
    let b = BoundingBox::from_key_points(&points).unwrap();
    assert_eq!(b, BoundingBox::new(0.0, 0.5, 1.0, 1.0));
  }
}
