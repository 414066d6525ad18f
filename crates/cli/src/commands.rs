//! Command implementations.

use anyhow::{Context, Result, bail};
use builder::{PopulateConfig, TermKind};
use oracle::{ChatCompletionsProvider, OracleProvider, RetryConfig, RetrySignal};
use personbench_core::{Config, Picture, load_dataset};
use quiz::{FaceFeatureGenerator, HoiFeatureGenerator, MixedFeatureGenerator, save_questions};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use vocab::{SynonymDict, SynonymStore, Vocabulary};

use crate::Family;

fn load_store(config: &Config) -> Result<SynonymStore> {
  let clothing = SynonymDict::load_or_default(&config.dict_path(Vocabulary::Clothing))?;
  let hoi = SynonymDict::load_or_default(&config.dict_path(Vocabulary::Hoi))?;
  let wearable = SynonymDict::load_or_default(&config.dict_path(Vocabulary::Wearable))?;
  Ok(SynonymStore::new(clothing, hoi, wearable))
}

pub fn cmd_generate(config: &Config, family: Family) -> Result<()> {
  let pictures = load_dataset(&config.dataset.path).context("loading dataset")?;
  let store = load_store(config)?;
  std::fs::create_dir_all(&config.output.dir)?;

  let mut rng = quiz::rng_from_seed(config.output.seed);

  if matches!(family, Family::Mixed | Family::All) {
    let generator = MixedFeatureGenerator {
      store: &store,
      dataset_dir: &config.dataset.path,
    };
    let filtered = generator.filter_pictures(&pictures);
    info!(pictures = filtered.len(), "Generating mixed-feature questions");
    let questions = generator.generate(&filtered, &mut rng);
    save_questions(&questions, &config.output.dir.join("mixed_feature_questions.json"))?;
  }

  if matches!(family, Family::Face | Family::All) {
    let generator = FaceFeatureGenerator {
      dataset_dir: &config.dataset.path,
    };
    let filtered = generator.filter_pictures(&pictures);
    info!(pictures = filtered.len(), "Generating face-feature questions");
    let questions = generator.generate(&filtered);
    save_questions(&questions, &config.output.dir.join("multi_face_feature_questions.json"))?;
  }

  if matches!(family, Family::Hoi | Family::All) {
    let generator = HoiFeatureGenerator {
      store: &store,
      dataset_dir: &config.dataset.path,
    };
    let filtered = generator.filter_pictures(&pictures);
    info!(pictures = filtered.len(), "Generating multi-image HOI questions");
    let questions = generator.generate(&filtered);
    save_questions(&questions, &config.output.dir.join("multi_hoi_questions.json"))?;
  }

  Ok(())
}

pub async fn cmd_vocab_build(config: &Config, vocabulary: Vocabulary) -> Result<()> {
  let pictures = load_dataset(&config.dataset.path).context("loading dataset")?;
  let dict_path = config.dict_path(vocabulary);
  let dict = SynonymDict::load_or_default(&dict_path)?;

  let pairs = match vocabulary {
    Vocabulary::Clothing => {
      let filtered = quiz::clothing::filter_pictures(&pictures);
      let maps = quiz::clothing::build_maps(&filtered);
      let names: std::collections::BTreeSet<String> = maps.names().map(str::to_string).collect();
      let colors: std::collections::BTreeSet<String> = maps.colors().map(str::to_string).collect();
      let mut pairs = builder::enumerate_pairs(&names, TermKind::ClothingName, &dict);
      pairs.extend(builder::enumerate_pairs(&colors, TermKind::ClothingColor, &dict));
      pairs
    }
    Vocabulary::Hoi => {
      let filtered: Vec<&Picture> = pictures
        .iter()
        .filter(|p| p.persons.iter().any(|person| !person.hois.is_empty()))
        .collect();
      let (objects, actions) = builder::collect_hoi_terms(&filtered);
      let mut pairs = builder::enumerate_pairs(&objects, TermKind::HoiObject, &dict);
      pairs.extend(builder::enumerate_pairs(&actions, TermKind::HoiAction, &dict));
      pairs
    }
    Vocabulary::Wearable => {
      bail!("the wearable dictionary is curated by hand; use `personbench vocab link wearable <a> <b>`")
    }
  };

  if pairs.is_empty() {
    info!("No new term pairs to adjudicate");
    return Ok(());
  }
  info!(pairs = pairs.len(), vocabulary = vocabulary.as_str(), "Adjudicating term pairs");

  let provider = ChatCompletionsProvider::new(
    &config.oracle.base_url,
    &config.oracle.model,
    &config.oracle.api_key,
    config.oracle.timeout_secs,
  );
  if !provider.is_available() {
    bail!("oracle endpoint is not configured; set [oracle] base_url and model");
  }

  let signal = RetrySignal::new();
  spawn_retry_signal_handler(signal.clone());

  let cancel = CancellationToken::new();
  let ctrl_c_cancel = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      warn!("Interrupt received: draining in-flight oracle calls");
      ctrl_c_cancel.cancel();
    }
  });

  let populate_config = PopulateConfig {
    workers: config.builder.workers,
    checkpoint_every: config.builder.checkpoint_every,
    dict_path,
    retry: RetryConfig {
      max_retries: config.builder.max_retries,
      base_delay: Duration::from_secs(config.builder.base_delay_secs),
      max_delay: Duration::from_secs(config.builder.max_delay_secs),
    },
  };

  let (_, stats) = builder::populate(pairs, dict, Box::new(provider), populate_config, signal, cancel).await?;
  info!(
    processed = stats.processed,
    synonyms = stats.synonyms,
    distinguishable = stats.distinguishable,
    failed = stats.failed,
    "Vocabulary build complete"
  );
  Ok(())
}

/// Sends a manual retry on SIGUSR1 so a backed-off oracle call can be
/// re-attempted as soon as the backing server is reachable again.
#[cfg(unix)]
fn spawn_retry_signal_handler(signal: RetrySignal) {
  tokio::spawn(async move {
    let Ok(mut stream) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::user_defined1()) else {
      return;
    };
    while stream.recv().await.is_some() {
      info!("SIGUSR1 received: triggering immediate retry");
      signal.trigger();
    }
  });
}

#[cfg(not(unix))]
fn spawn_retry_signal_handler(_signal: RetrySignal) {}

pub fn cmd_vocab_closure(config: &Config, vocabulary: Vocabulary) -> Result<()> {
  let path = config.dict_path(vocabulary);
  let dict = SynonymDict::load(&path).with_context(|| format!("loading {}", path.display()))?;

  let before: usize = dict.synonyms.values().map(Vec::len).sum();
  let closed = vocab::closure(&dict);
  let after: usize = closed.synonyms.values().map(Vec::len).sum();

  info!(
    terms = closed.synonyms.len(),
    relations_before = before,
    relations_added = after - before,
    "Synonym closure computed"
  );
  closed.save(&path)?;
  Ok(())
}

pub fn cmd_vocab_link(config: &Config, vocabulary: Vocabulary, a: &str, b: &str) -> Result<()> {
  if a == b {
    bail!("the two terms must differ");
  }
  let path = config.dict_path(vocabulary);
  let mut dict = SynonymDict::load(&path).with_context(|| format!("loading {}", path.display()))?;

  for term in [a, b] {
    if !dict.synonyms.contains_key(term) {
      bail!("'{}' is not in the {} vocabulary", term, vocabulary.as_str());
    }
  }
  dict.add_synonym(a, b);
  dict.save(&path)?;
  info!(a, b, "Registered synonym pair");
  Ok(())
}
