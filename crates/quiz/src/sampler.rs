//! Seeded sampling helpers for template filling.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// RNG for a generation run; a fixed seed makes runs reproducible.
pub fn rng_from_seed(seed: u64) -> StdRng {
  StdRng::seed_from_u64(seed)
}

/// One uniformly random element, `None` on an empty slice.
pub fn choose<'a, T>(rng: &mut StdRng, items: &'a [T]) -> Option<&'a T> {
  items.choose(rng)
}

/// `k` distinct elements, `None` when the slice has fewer than `k`.
pub fn sample<'a, T>(rng: &mut StdRng, items: &'a [T], k: usize) -> Option<Vec<&'a T>> {
  if items.len() < k {
    return None;
  }
  Some(items.choose_multiple(rng, k).collect())
}

/// `k` elements drawn with replacement, `None` on an empty slice.
pub fn choices<'a, T>(rng: &mut StdRng, items: &'a [T], k: usize) -> Option<Vec<&'a T>> {
  if items.is_empty() {
    return None;
  }
  Some((0..k).map(|_| &items[rng.gen_range(0..items.len())]).collect())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_choose_empty() {
    let mut rng = rng_from_seed(1);
    let empty: Vec<u32> = Vec::new();
    assert!(choose(&mut rng, &empty).is_none());
    assert!(choose(&mut rng, &[7]).is_some());
  }

  #[test]
  fn test_sample_requires_enough_items() {
    let mut rng = rng_from_seed(1);
    assert!(sample(&mut rng, &[1, 2], 3).is_none());
    let picked = sample(&mut rng, &[1, 2, 3, 4], 3).unwrap();
    assert_eq!(picked.len(), 3);
    let mut values: Vec<i32> = picked.into_iter().copied().collect();
    values.sort();
    values.dedup();
    assert_eq!(values.len(), 3, "sample must be distinct");
  }

  #[test]
  fn test_choices_with_replacement() {
    let mut rng = rng_from_seed(1);
    let picked = choices(&mut rng, &[1], 3).unwrap();
    assert_eq!(picked, vec![&1, &1, &1]);
    assert!(choices::<i32>(&mut rng, &[], 1).is_none());
  }

  #[test]
  fn test_seeded_runs_are_reproducible() {
    let items: Vec<u32> = (0..100).collect();
    let a: Vec<&u32> = (0..10).map(|_| choose(&mut rng_from_seed(42), &items).unwrap()).collect();
    let b: Vec<&u32> = (0..10).map(|_| choose(&mut rng_from_seed(42), &items).unwrap()).collect();
    assert_eq!(a, b);
  }
}
