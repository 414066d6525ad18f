//! Synonym dictionaries and the read-only store over them.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;

/// The three independent synonym vocabularies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vocabulary {
  /// Clothing item names and clothing colors.
  Clothing,
  /// Human-object-interaction actions and object names.
  Hoi,
  /// Free-form wearable terms.
  Wearable,
}

impl Vocabulary {
  pub fn as_str(&self) -> &'static str {
    match self {
      Vocabulary::Clothing => "clothing",
      Vocabulary::Hoi => "hoi",
      Vocabulary::Wearable => "wearable",
    }
  }

  /// Conventional dictionary file name for this vocabulary.
  pub fn dict_file_name(&self) -> &'static str {
    match self {
      Vocabulary::Clothing => "clothing_synonym_dict.json",
      Vocabulary::Hoi => "hoi_synonym_dict.json",
      Vocabulary::Wearable => "wearable_synonym_dict.json",
    }
  }
}

impl std::str::FromStr for Vocabulary {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "clothing" => Ok(Vocabulary::Clothing),
      "hoi" => Ok(Vocabulary::Hoi),
      "wearable" => Ok(Vocabulary::Wearable),
      _ => Err(format!("Unknown vocabulary: {}", s)),
    }
  }
}

/// One vocabulary's persisted state: term → synonyms, term → known-distinct.
///
/// Edges are registered symmetrically but the file may have drifted (manual
/// edits, interrupted runs), so readers never rely on symmetry. Missing keys
/// mean "no known relations". Entry order is a convenience, not semantics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynonymDict {
  #[serde(default)]
  pub synonyms: BTreeMap<String, Vec<String>>,
  #[serde(default)]
  pub distinguishable: BTreeMap<String, Vec<String>>,
}

impl SynonymDict {
  pub fn load(path: &Path) -> Result<SynonymDict> {
    let text = std::fs::read_to_string(path)?;
    let dict: SynonymDict = serde_json::from_str(&text)?;
    debug!(
      path = %path.display(),
      synonyms = dict.synonyms.len(),
      distinguishable = dict.distinguishable.len(),
      "Loaded synonym dictionary"
    );
    Ok(dict)
  }

  /// Load a dictionary, or start empty when the file does not exist yet.
  pub fn load_or_default(path: &Path) -> Result<SynonymDict> {
    if path.exists() {
      SynonymDict::load(path)
    } else {
      debug!(path = %path.display(), "No synonym dictionary yet, starting empty");
      Ok(SynonymDict::default())
    }
  }

  pub fn save(&self, path: &Path) -> Result<()> {
    let text = serde_json::to_string_pretty(self)?;
    std::fs::write(path, text)?;
    Ok(())
  }

  /// Ensure a term has (possibly empty) entries in both maps.
  pub fn register_term(&mut self, term: &str) {
    self.synonyms.entry(term.to_string()).or_default();
    self.distinguishable.entry(term.to_string()).or_default();
  }

  /// Record `a` and `b` as synonyms, symmetrically.
  pub fn add_synonym(&mut self, a: &str, b: &str) {
    let fwd = self.synonyms.entry(a.to_string()).or_default();
    if !fwd.iter().any(|t| t == b) {
      fwd.push(b.to_string());
    }
    let rev = self.synonyms.entry(b.to_string()).or_default();
    if !rev.iter().any(|t| t == a) {
      rev.push(a.to_string());
    }
  }

  /// Record `a` and `b` as reliably distinguishable, symmetrically.
  pub fn add_distinguishable(&mut self, a: &str, b: &str) {
    let fwd = self.distinguishable.entry(a.to_string()).or_default();
    if !fwd.iter().any(|t| t == b) {
      fwd.push(b.to_string());
    }
    let rev = self.distinguishable.entry(b.to_string()).or_default();
    if !rev.iter().any(|t| t == a) {
      rev.push(a.to_string());
    }
  }

  /// Whether a pair has already been adjudicated (either verdict). Used to
  /// skip oracle calls on resumed population runs.
  pub fn pair_known(&self, a: &str, b: &str) -> bool {
    (self.synonyms.contains_key(a) && self.synonyms.contains_key(b))
      || (self.distinguishable.contains_key(a) && self.distinguishable.contains_key(b))
  }

  pub fn synonyms_of(&self, term: &str) -> &[String] {
    self.synonyms.get(term).map(Vec::as_slice).unwrap_or(&[])
  }
}

/// Read-only view over all three vocabularies, shared by every generator.
#[derive(Debug, Clone, Default)]
pub struct SynonymStore {
  clothing: SynonymDict,
  hoi: SynonymDict,
  wearable: SynonymDict,
}

impl SynonymStore {
  pub fn new(clothing: SynonymDict, hoi: SynonymDict, wearable: SynonymDict) -> Self {
    Self { clothing, hoi, wearable }
  }

  pub fn dict(&self, vocab: Vocabulary) -> &SynonymDict {
    match vocab {
      Vocabulary::Clothing => &self.clothing,
      Vocabulary::Hoi => &self.hoi,
      Vocabulary::Wearable => &self.wearable,
    }
  }

  /// True iff `a == b` or either term lists the other as a synonym.
  ///
  /// Closure keeps the maps symmetric, but a hand-edited or partially
  /// checkpointed file may not be, so both directions are checked.
  pub fn is_synonym(&self, vocab: Vocabulary, a: &str, b: &str) -> bool {
    if a == b {
      return true;
    }
    let dict = self.dict(vocab);
    dict.synonyms_of(a).iter().any(|t| t == b) || dict.synonyms_of(b).iter().any(|t| t == a)
  }

  /// The terms plus every registered synonym of each.
  pub fn expand<'a, I>(&self, vocab: Vocabulary, terms: I) -> BTreeSet<String>
  where
    I: IntoIterator<Item = &'a str>,
  {
    let dict = self.dict(vocab);
    let mut result = BTreeSet::new();
    for term in terms {
      result.insert(term.to_string());
      for synonym in dict.synonyms_of(term) {
        result.insert(synonym.clone());
      }
    }
    result
  }
}
