//! Oracle question phrasing and cheap local prefilters.

use oracle::Decision;

use crate::pairs::TermKind;

/// The yes/no question put to the judgment model for a term pair. Every
/// phrasing ends with the same final-line instruction the decision parser
/// expects (see [`oracle::Decision::from_response`]).
pub fn question_for(kind: TermKind, a: &str, b: &str) -> String {
  match kind {
    TermKind::HoiObject => format!(
      "'{a}' and '{b}' are words describing two objects. Please analyze their meanings and decide \
       if they are looking alike, of same meaning, or one of them can be a part of the other visually. \
       At the end of your answer, please put a single line of 'yes' if they are some kind of synonymous \
       or might have some visual belonging relationship as said, put 'no' if they are not."
    ),
    TermKind::HoiAction => format!(
      "'{a}' and '{b}' are words describing two actions for a human to interact with objects. Please \
       analyze their meanings and decide if they can possibly look alike in static images, are of same \
       meaning, or one of them belongs to the other. At the end of your answer, please put a single line \
       of 'yes' if they might look alike as said or 'no' if they are not."
    ),
    TermKind::ClothingName | TermKind::Wearable => format!(
      "'{a}' and '{b}' are words describing two wearable items. Please analyze their meanings and decide \
       if they are looking alike, of same meaning, or one of them belongs to the other. At the end of \
       your answer, please put 'yes' if they are some kind of synonymous as said or 'no' if they are not."
    ),
    TermKind::ClothingColor => format!(
      "'{a}' and '{b}' are words describing two color types of some wearings. Please analyze their \
       meanings and decide if they are looking alike, of same meaning, possibly hard to distinguish, or \
       one of them belongs to the other. At the end of your answer, please put 'yes' if they are this \
       kind of similar color pattern or 'no' if they are not."
    ),
  }
}

/// Local short-circuit that avoids an oracle round trip when the verdict is
/// already clear. Wearable-family pairs whose words do not overlap at all
/// are reliably distinguishable; everything else goes to the oracle.
pub fn prefilter(kind: TermKind, a: &str, b: &str) -> Option<Decision> {
  match kind {
    TermKind::ClothingName | TermKind::ClothingColor | TermKind::Wearable => {
      if words_overlap(a, b) {
        None
      } else {
        Some(Decision::Distinguishable)
      }
    }
    TermKind::HoiObject | TermKind::HoiAction => None,
  }
}

/// Whether any word of one term occurs inside the other term.
fn words_overlap(a: &str, b: &str) -> bool {
  a.split_whitespace().any(|word| b.contains(word)) || b.split_whitespace().any(|word| a.contains(word))
}
