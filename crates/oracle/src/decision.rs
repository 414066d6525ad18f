//! Verdict extraction from free-text oracle answers.

/// Outcome of a synonymy judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Synonymous,
  Distinguishable,
}

impl Decision {
  /// Locate the rightmost occurrence of "yes" vs "no" in the response and
  /// let whichever sits closer to the end win — models often reverse
  /// themselves mid-answer, and the final word is the actual verdict.
  ///
  /// Mechanically: search the reversed lowercased text for the reversed
  /// needles; a needle that never occurs gets an infinite index; the
  /// smaller reversed index wins, ties and double-absence read as "no".
  /// This exact procedure is a compatibility contract with previously
  /// built dictionaries; do not replace it with a first-match scan.
  pub fn from_response(text: &str) -> Decision {
    let reversed: String = text.to_lowercase().chars().rev().collect();
    let yes_idx = reversed.find("sey").unwrap_or(usize::MAX);
    let no_idx = reversed.find("on").unwrap_or(usize::MAX);
    if yes_idx < no_idx {
      Decision::Synonymous
    } else {
      Decision::Distinguishable
    }
  }

  pub fn is_synonymous(&self) -> bool {
    matches!(self, Decision::Synonymous)
  }
}
