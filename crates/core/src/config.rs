//! Configuration for personbench with per-project overrides.
//!
//! Config priority: explicit path > project-relative (personbench.toml) >
//! user (~/.config/personbench/config.toml) > built-in defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub dataset: DatasetConfig,
  pub vocab: VocabConfig,
  pub oracle: OracleConfig,
  pub builder: BuilderConfig,
  pub output: OutputConfig,
}

/// Where the annotated dataset lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
  /// Directory with one annotation JSON per picture, images alongside.
  pub path: PathBuf,
}

impl Default for DatasetConfig {
  fn default() -> Self {
    Self {
      path: PathBuf::from("./final_labeling"),
    }
  }
}

/// Synonym dictionary locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabConfig {
  /// Directory holding the per-vocabulary dictionary files.
  pub dir: PathBuf,
}

impl Default for VocabConfig {
  fn default() -> Self {
    Self { dir: PathBuf::from(".") }
  }
}

/// Synonymy oracle endpoint (an OpenAI-compatible chat completions server).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
  pub base_url: String,

  pub model: String,

  /// Sent as a bearer token; local servers usually ignore it.
  pub api_key: String,

  /// Per-request timeout in seconds. Large by default: the judgment model
  /// is slow and a timeout is retried like any other transient failure.
  pub timeout_secs: u64,
}

impl Default for OracleConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:2336/v1".to_string(),
      model: "qwen2.5-vl-72b".to_string(),
      api_key: "NONONO".to_string(),
      timeout_secs: 1000,
    }
  }
}

/// Synonym-dictionary population settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
  /// Concurrent oracle calls (default: 16)
  pub workers: usize,

  /// Checkpoint the dictionary to disk every N verdicts (default: 100)
  pub checkpoint_every: usize,

  /// Maximum retry attempts per oracle call (default: 7)
  pub max_retries: u32,

  /// Initial retry backoff in seconds, doubled per attempt (default: 2)
  pub base_delay_secs: u64,

  /// Backoff cap in seconds (default: 600)
  pub max_delay_secs: u64,
}

impl Default for BuilderConfig {
  fn default() -> Self {
    Self {
      workers: 16,
      checkpoint_every: 100,
      max_retries: 7,
      base_delay_secs: 2,
      max_delay_secs: 600,
    }
  }
}

/// Question output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
  /// Directory question JSON files are written to.
  pub dir: PathBuf,

  /// RNG seed for template sampling, so runs are reproducible.
  pub seed: u64,
}

impl Default for OutputConfig {
  fn default() -> Self {
    Self {
      dir: PathBuf::from("./questions"),
      seed: 42,
    }
  }
}

impl Config {
  /// Load config with the standard priority chain. An explicitly given path
  /// must parse; the implicit locations fall through on any problem.
  pub fn load(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
      let content = std::fs::read_to_string(path)?;
      return toml::from_str(&content).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)));
    }

    let project_config = PathBuf::from("personbench.toml");
    if project_config.exists()
      && let Ok(content) = std::fs::read_to_string(&project_config)
      && let Ok(config) = toml::from_str(&content)
    {
      return Ok(config);
    }

    if let Some(user_config) = Self::user_config_path()
      && user_config.exists()
      && let Ok(content) = std::fs::read_to_string(&user_config)
      && let Ok(config) = toml::from_str(&content)
    {
      return Ok(config);
    }

    Ok(Config::default())
  }

  pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("PERSONBENCH_CONFIG_DIR") {
      return Some(PathBuf::from(path).join("config.toml"));
    }
    dirs::config_dir().map(|p| p.join("personbench").join("config.toml"))
  }

  /// Dictionary file path for one vocabulary.
  pub fn dict_path(&self, vocab: vocab::Vocabulary) -> PathBuf {
    self.vocab.dir.join(vocab.dict_file_name())
  }
}
