//! Wallet Engine Library
//! # Overview
//!
//! This library maintains monetary balances for independently identified
//! wallets and applies deposit/withdraw mutations with strict per-wallet
//! ordering under concurrent access.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (wallet ids, operation requests, errors)
//! - [`core`] - Engine components:
//!   - [`core::queue_manager`] - One lane (bounded queue + single worker) per wallet
//!   - [`core::executor`] - Transactional read-modify-write against the store
//!   - [`core::balance_cache`] - Short-lived read-through balance cache
//!   - [`core::traits`] / [`core::memory_store`] - Durable store contract and in-memory implementation
//!   - [`core::engine`] - Facade tying the pieces together
//! - [`io`] - CSV input/output for the replay binary
//! - [`replay`] - Batch replay of a CSV file through the engine
//! - [`cli`] - CLI arguments parsing and logging setup
//!
//! # Operations
//!
//! - **Deposit**: Credit funds to a wallet, creating it on first use
//! - **Withdraw**: Debit funds from a wallet; rejected when the balance is
//!   smaller than the amount
//!
//! # Consistency
//!
//! - Mutations for one wallet never overlap and run in submission order
//! - Each mutation is one store transaction holding the wallet's row lock
//! - A successful mutation evicts the wallet's cached balance before its
//!   result is delivered
//! - Cached reads are at most one TTL stale

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod replay;
pub mod types;

pub use core::{
    BalanceCache, BalanceReading, EngineConfig, MemoryStore, MutationExecutor, PendingOperation,
    QueueManager, Store, StoreTransaction, WalletEngine,
};
pub use io::write_balances_csv;
pub use types::{
    ErrorKind, OperationKind, OperationRequest, OperationResult, StoreError, Wallet, WalletError,
    WalletId,
};
