//! personbench CLI - curate a person-centric VQA benchmark from annotated
//! images.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use personbench_core::Config;

mod commands;

use commands::{cmd_generate, cmd_vocab_build, cmd_vocab_closure, cmd_vocab_link};

#[derive(Parser)]
#[command(name = "personbench")]
#[command(about = "Curate person-centric VQA benchmark questions from annotated images")]
#[command(after_help = "\
QUICK START:
  personbench vocab build clothing   # Adjudicate clothing synonyms (oracle required)
  personbench vocab closure clothing # Complete synonym components into cliques
  personbench generate mixed         # Emit mixed-feature questions

During a vocab build, send SIGUSR1 to retry a backed-off oracle call
immediately; Ctrl-C stops enqueueing and lets in-flight calls finish.")]
struct Cli {
  /// Explicit config file (default: personbench.toml, then user config)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Override the dataset directory
  #[arg(long, global = true)]
  dataset: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Generate benchmark questions
  Generate {
    #[arg(value_enum)]
    family: Family,
    /// RNG seed override for reproducible sampling
    #[arg(long)]
    seed: Option<u64>,
  },
  /// Synonym dictionary maintenance
  Vocab {
    #[command(subcommand)]
    command: VocabCommand,
  },
}

#[derive(Subcommand)]
enum VocabCommand {
  /// Populate a dictionary by querying the judgment oracle
  Build { vocabulary: vocab::Vocabulary },
  /// Complete every synonym component into a clique and rewrite the file
  Closure { vocabulary: vocab::Vocabulary },
  /// Register one synonym pair by hand (both terms must already exist)
  Link {
    vocabulary: vocab::Vocabulary,
    a: String,
    b: String,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Family {
  Mixed,
  Face,
  Hoi,
  All,
}

fn init_logging() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
    .init();
}

#[tokio::main]
async fn main() -> Result<()> {
  init_logging();
  let cli = Cli::parse();

  let mut config = Config::load(cli.config.as_deref())?;
  if let Some(dataset) = cli.dataset {
    config.dataset.path = dataset;
  }

  match cli.command {
    Commands::Generate { family, seed } => {
      if let Some(seed) = seed {
        config.output.seed = seed;
      }
      cmd_generate(&config, family)
    }
    Commands::Vocab { command } => match command {
      VocabCommand::Build { vocabulary } => cmd_vocab_build(&config, vocabulary).await,
      VocabCommand::Closure { vocabulary } => cmd_vocab_closure(&config, vocabulary),
      VocabCommand::Link { vocabulary, a, b } => cmd_vocab_link(&config, vocabulary, &a, &b),
    },
  }
}
