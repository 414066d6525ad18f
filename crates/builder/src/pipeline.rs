//! Concurrent dictionary population.
//!
//! Shape: a feeder pushes candidate pairs into a bounded channel; a pool of
//! oracle workers pulls from it and emits verdict messages; a single writer
//! task owns the dictionary, applies verdicts symmetrically and checkpoints
//! it to disk every N verdicts. Ownership replaces locking around the maps,
//! and a checkpointed run can be resumed because already-adjudicated pairs
//! are skipped at enumeration time.
//!
//! Cancellation stops the feeder; in-flight oracle calls finish (or time
//! out) and their verdicts still land in the dictionary.

use std::path::PathBuf;
use std::sync::Arc;

use oracle::{Decision, OracleProvider, RetryConfig, RetrySignal, judge_with_retry};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vocab::SynonymDict;

use crate::error::Result;
use crate::pairs::CandidatePair;
use crate::prompts::{prefilter, question_for};

#[derive(Debug, Clone)]
pub struct PopulateConfig {
  /// Concurrent oracle workers.
  pub workers: usize,
  /// Checkpoint the dictionary every N verdicts.
  pub checkpoint_every: usize,
  /// Where checkpoints and the final dictionary are written.
  pub dict_path: PathBuf,
  pub retry: RetryConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateStats {
  pub processed: usize,
  pub synonyms: usize,
  pub distinguishable: usize,
  /// Pairs left unresolved after exhausting retries; a later run picks
  /// them up again.
  pub failed: usize,
}

enum WorkerMessage {
  Verdict { a: String, b: String, decision: Decision },
  Failed,
}

/// Run the population pipeline over `pairs`, starting from `dict`.
/// Returns the updated dictionary and run statistics.
pub async fn populate(
  pairs: Vec<CandidatePair>,
  mut dict: SynonymDict,
  provider: Box<dyn OracleProvider>,
  config: PopulateConfig,
  signal: RetrySignal,
  cancel: CancellationToken,
) -> Result<(SynonymDict, PopulateStats)> {
  let total = pairs.len();
  info!(total, workers = config.workers, "Starting dictionary population");

  // Every term gets its (possibly empty) entries up front, so resumption
  // skip logic sees the terms of this run as adjudicated next time.
  for pair in &pairs {
    dict.register_term(&pair.a);
    dict.register_term(&pair.b);
  }

  let (pair_tx, pair_rx) = mpsc::channel::<CandidatePair>(config.workers * 2);
  let (verdict_tx, mut verdict_rx) = mpsc::channel::<WorkerMessage>(config.workers * 2);
  let pair_rx = Arc::new(Mutex::new(pair_rx));

  // Feeder: stops enqueueing when cancelled, lets in-flight calls finish.
  let feeder_cancel = cancel.clone();
  tokio::spawn(async move {
    for pair in pairs {
      if feeder_cancel.is_cancelled() {
        debug!("Population cancelled, no further pairs enqueued");
        break;
      }
      if pair_tx.send(pair).await.is_err() {
        break;
      }
    }
  });

  for worker_id in 0..config.workers.max(1) {
    let rx = pair_rx.clone();
    let tx = verdict_tx.clone();
    let provider = provider.clone();
    let retry = config.retry.clone();
    let signal = signal.clone();
    tokio::spawn(async move {
      oracle_worker(worker_id, rx, tx, provider, retry, signal).await;
    });
  }
  drop(verdict_tx);

  // Writer: sole owner of the dictionary from here on.
  let mut stats = PopulateStats::default();
  while let Some(message) = verdict_rx.recv().await {
    match message {
      WorkerMessage::Verdict { a, b, decision } => {
        match decision {
          Decision::Synonymous => {
            dict.add_synonym(&a, &b);
            stats.synonyms += 1;
          }
          Decision::Distinguishable => {
            dict.add_distinguishable(&a, &b);
            stats.distinguishable += 1;
          }
        }
        stats.processed += 1;
        if config.checkpoint_every > 0 && stats.processed % config.checkpoint_every == 0 {
          debug!(processed = stats.processed, total, "Checkpointing dictionary");
          if let Err(e) = dict.save(&config.dict_path) {
            warn!(err = %e, path = %config.dict_path.display(), "Checkpoint failed, continuing");
          }
        }
      }
      WorkerMessage::Failed => {
        stats.processed += 1;
        stats.failed += 1;
      }
    }
  }

  dict.save(&config.dict_path)?;
  info!(
    processed = stats.processed,
    synonyms = stats.synonyms,
    distinguishable = stats.distinguishable,
    failed = stats.failed,
    "Dictionary population finished"
  );
  Ok((dict, stats))
}

async fn oracle_worker(
  worker_id: usize,
  rx: Arc<Mutex<mpsc::Receiver<CandidatePair>>>,
  tx: mpsc::Sender<WorkerMessage>,
  provider: Box<dyn OracleProvider>,
  retry: RetryConfig,
  signal: RetrySignal,
) {
  loop {
    let pair = {
      let mut guard = rx.lock().await;
      guard.recv().await
    };
    let Some(pair) = pair else {
      debug!(worker_id, "Pair channel drained, worker exiting");
      break;
    };

    let decision = match prefilter(pair.kind, &pair.a, &pair.b) {
      Some(decision) => Ok(decision),
      None => {
        let question = question_for(pair.kind, &pair.a, &pair.b);
        judge_with_retry(provider.as_ref(), &question, &retry, &signal)
          .await
          .map(|answer| Decision::from_response(&answer))
      }
    };

    let message = match decision {
      Ok(decision) => WorkerMessage::Verdict {
        a: pair.a,
        b: pair.b,
        decision,
      },
      Err(e) => {
        warn!(worker_id, a = %pair.a, b = %pair.b, err = %e, "Pair left unresolved");
        WorkerMessage::Failed
      }
    };
    if tx.send(message).await.is_err() {
      break;
    }
  }
}
