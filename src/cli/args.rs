use crate::core::EngineConfig;
use crate::replay::ReplayConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Replay wallet deposit/withdraw operations through per-wallet lanes
#[derive(Parser, Debug)]
#[command(name = "wallet-engine")]
#[command(about = "Replay wallet operations with per-wallet serialization", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing operation records
    #[arg(value_name = "INPUT", help = "Path to the input CSV file (wallet_id,operation,amount)")]
    pub input_file: PathBuf,

    /// Balance cache TTL in seconds
    #[arg(
        long = "cache-ttl",
        value_name = "SECONDS",
        env = "WALLET_BALANCE_CACHE_TTL",
        default_value_t = 10
    )]
    pub cache_ttl_secs: u64,

    /// Maximum pending operations per wallet lane
    #[arg(long = "lane-capacity", value_name = "COUNT", default_value_t = 100)]
    pub lane_capacity: usize,

    /// How long to wait for room in a full lane (0 = fail fast)
    #[arg(long = "enqueue-timeout-ms", value_name = "MILLIS", default_value_t = 5000)]
    pub enqueue_timeout_ms: u64,

    /// Deadline for one store transaction
    #[arg(long = "operation-timeout-ms", value_name = "MILLIS", default_value_t = 5000)]
    pub operation_timeout_ms: u64,

    /// Retire lanes idle for this long (0 = keep lanes forever)
    #[arg(long = "lane-idle-timeout-secs", value_name = "SECONDS", default_value_t = 60)]
    pub lane_idle_timeout_secs: u64,

    /// Number of rows read per batch
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of rows read per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Tokio worker threads
    #[arg(
        long = "worker-threads",
        value_name = "COUNT",
        help = "Number of runtime worker threads (default: CPU cores)"
    )]
    pub worker_threads: Option<usize>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Build the engine configuration from the parsed flags
    pub fn to_engine_config(&self) -> EngineConfig {
        let idle = match self.lane_idle_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        EngineConfig::new(Duration::from_secs(self.cache_ttl_secs), self.lane_capacity)
            .with_enqueue_timeout(Duration::from_millis(self.enqueue_timeout_ms))
            .with_operation_timeout(Duration::from_millis(self.operation_timeout_ms))
            .with_lane_idle_timeout(idle)
    }

    /// Build the replay configuration, falling back to defaults for omitted values
    pub fn to_replay_config(&self) -> ReplayConfig {
        let default = ReplayConfig::default();
        ReplayConfig::new(
            self.to_engine_config(),
            self.batch_size.unwrap_or(default.batch_size),
            self.worker_threads.unwrap_or(default.worker_threads),
        )
    }
}
