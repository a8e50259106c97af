//! CSV replay driver
//!
//! Reads operations from a CSV file, pushes them through a [`WalletEngine`]
//! backed by a [`MemoryStore`], and writes the final balances as CSV.
//!
//! # Architecture
//!
//! ```text
//! ReplayRunner
//!     ├── ReplayConfig (engine config, batch_size, worker_threads)
//!     ├── AsyncReader (batch CSV reading)
//!     └── WalletEngine<MemoryStore>
//!             └── QueueManager (one lane per wallet)
//! ```
//!
//! # Ordering
//!
//! Rows are submitted one by one in file order and each submission returns
//! once the row sits in its wallet's lane, so rows for one wallet execute in
//! file order while different wallets proceed in parallel. Outcomes are
//! awaited per batch before the next batch is read.

use std::io::Write;
use std::path::Path;

use futures::future::join_all;

use crate::core::{EngineConfig, MemoryStore, WalletEngine};
use crate::io::{write_balances_csv, AsyncReader};

/// Configuration for a replay run
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Engine settings (cache, lanes, timeouts)
    pub engine: EngineConfig,
    /// Number of rows read per batch
    pub batch_size: usize,
    /// Tokio worker threads
    pub worker_threads: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            batch_size: 1000,
            worker_threads: num_cpus::get(),
        }
    }
}

impl ReplayConfig {
    /// Create a ReplayConfig with custom values
    ///
    /// Zero values fall back to the defaults with a warning.
    pub fn new(engine: EngineConfig, batch_size: usize, worker_threads: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            tracing::warn!(
                "Invalid batch_size ({}), using default ({})",
                batch_size,
                default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let worker_threads = if worker_threads == 0 {
            tracing::warn!(
                "Invalid worker_threads ({}), using default ({})",
                worker_threads,
                default.worker_threads
            );
            default.worker_threads
        } else {
            worker_threads
        };

        Self {
            engine,
            batch_size,
            worker_threads,
        }
    }
}

/// Counters reported at the end of a replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Operations that committed
    pub committed: usize,
    /// Operations that reached a lane but did not commit
    pub failed: usize,
    /// Rows dropped before reaching a lane (malformed or full lane)
    pub rejected: usize,
}

/// Runs a CSV file of operations through the engine
#[derive(Debug, Clone)]
pub struct ReplayRunner {
    config: ReplayConfig,
}

impl ReplayRunner {
    pub fn new(config: ReplayConfig) -> Self {
        Self { config }
    }

    /// Replay `input_path` and write the resulting balances to `output`
    ///
    /// # Errors
    ///
    /// Fatal problems only (runtime creation, missing input, output write).
    /// Failed operations are counted in the summary and processing continues.
    pub fn run(&self, input_path: &Path, output: &mut dyn Write) -> Result<ReplaySummary, String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.worker_threads)
            .enable_time()
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            let engine = WalletEngine::new(MemoryStore::new(), self.config.engine.clone());

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", input_path.display(), e))?;
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut summary = ReplaySummary::default();
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }
                summary.rejected += batch.rejected;

                let mut pending = Vec::with_capacity(batch.requests.len());
                for request in batch.requests {
                    match engine.submit(request).await {
                        Ok(operation) => pending.push(operation.outcome()),
                        Err(_) => summary.rejected += 1,
                    }
                }

                for outcome in join_all(pending).await {
                    match outcome {
                        Ok(_) => summary.committed += 1,
                        Err(_) => summary.failed += 1,
                    }
                }
            }

            let wallets = engine
                .wallets()
                .await
                .map_err(|e| format!("Failed to list wallets: {}", e))?;
            write_balances_csv(&wallets, output)?;

            tracing::info!(
                committed = summary.committed,
                failed = summary.failed,
                rejected = summary.rejected,
                wallets = wallets.len(),
                "Replay finished"
            );
            Ok(summary)
        })
    }
}
