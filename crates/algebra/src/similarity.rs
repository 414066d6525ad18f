//! Token-sort fuzzy similarity for free-text observations.
//!
//! Reproduces the token_sort_ratio contract: lowercase, split on
//! non-alphanumeric, sort the tokens, rejoin, then score the two normalized
//! strings by Levenshtein similarity on a 0–100 scale. Word order therefore
//! never affects the score.

/// Similarity of `a` and `b` in percent, invariant under token reordering.
pub fn token_sort_ratio(a: &str, b: &str) -> u32 {
  let na = normalize(a);
  let nb = normalize(b);
  if na.is_empty() && nb.is_empty() {
    return 100;
  }
  let dist = levenshtein(&na, &nb);
  let longest = na.chars().count().max(nb.chars().count());
  if longest == 0 {
    return 100;
  }
  (100.0 * (1.0 - dist as f64 / longest as f64)).round() as u32
}

fn normalize(text: &str) -> String {
  let mut tokens: Vec<String> = text
    .to_lowercase()
    .split(|c: char| !c.is_alphanumeric())
    .filter(|t| !t.is_empty())
    .map(str::to_string)
    .collect();
  tokens.sort();
  tokens.join(" ")
}

/// Classic two-row Levenshtein distance over chars.
fn levenshtein(a: &str, b: &str) -> usize {
  let a: Vec<char> = a.chars().collect();
  let b: Vec<char> = b.chars().collect();
  if a.is_empty() {
    return b.len();
  }
  if b.is_empty() {
    return a.len();
  }

  let mut prev: Vec<usize> = (0..=b.len()).collect();
  let mut curr = vec![0usize; b.len() + 1];
  for (i, ca) in a.iter().enumerate() {
    curr[0] = i + 1;
    for (j, cb) in b.iter().enumerate() {
      let cost = if ca == cb { 0 } else { 1 };
      curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
    }
    std::mem::swap(&mut prev, &mut curr);
  }
  prev[b.len()]
}
