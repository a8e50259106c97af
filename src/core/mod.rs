//! Core engine module
//!
//! This module contains the concurrency and consistency components:
//! - `traits` - Durable store abstractions (transactions with row locks)
//! - `memory_store` - In-process store implementing those traits
//! - `executor` - Transactional read-modify-write of one balance
//! - `balance_cache` - Short-lived read-through balance cache
//! - `queue_manager` - Per-wallet lanes serializing mutations
//! - `engine` - Facade combining store, cache and lanes
//! - `config` - Engine configuration

pub mod balance_cache;
pub mod config;
pub mod engine;
pub mod executor;
pub mod memory_store;
pub mod queue_manager;
pub mod traits;

pub use balance_cache::BalanceCache;
pub use config::EngineConfig;
pub use engine::{BalanceReading, WalletEngine};
pub use executor::MutationExecutor;
pub use memory_store::{MemoryStore, MemoryTransaction};
pub use queue_manager::{PendingOperation, QueueManager};
pub use traits::{Store, StoreTransaction};
