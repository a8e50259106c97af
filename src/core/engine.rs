//! Wallet engine facade
//!
//! `WalletEngine` is the entry point a transport layer talks to. It wires the
//! durable store, the balance cache and the per-wallet lanes together:
//!
//! ```text
//! WalletEngine
//!     ├── Arc<S: Store>            (durable balances, row locks)
//!     ├── Arc<BalanceCache>        (read path only, invalidated by lanes)
//!     └── QueueManager<S>          (one lane + worker per wallet)
//!             └── MutationExecutor<S>
//! ```
//!
//! Mutations always go through a lane and never read the cache. Balance
//! queries read the cache first and fall back to an unlocked store read,
//! bounded by the same operation timeout as a mutation.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::time::Instant;

use super::balance_cache::BalanceCache;
use super::config::EngineConfig;
use super::executor::{within, MutationExecutor};
use super::queue_manager::{PendingOperation, QueueManager};
use super::traits::Store;
use crate::types::{OperationRequest, OperationResult, StoreError, Wallet, WalletError, WalletId};

/// Answer to a balance query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceReading {
    pub wallet_id: WalletId,
    pub balance: Decimal,

    /// Whether the balance was served from the cache
    pub cached: bool,
}

/// Serialized wallet mutations plus cached balance reads
pub struct WalletEngine<S> {
    store: Arc<S>,
    cache: Arc<BalanceCache>,
    queue: QueueManager<S>,
    query_timeout: Duration,
}

impl<S> Clone for WalletEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            queue: self.queue.clone(),
            query_timeout: self.query_timeout,
        }
    }
}

impl<S: Store> WalletEngine<S> {
    /// Build an engine over `store`
    ///
    /// Must be called from within a tokio runtime once requests flow, since
    /// lanes spawn their workers on first use.
    pub fn new(store: S, config: EngineConfig) -> Self {
        let store = Arc::new(store);
        let cache = Arc::new(BalanceCache::new(config.cache_ttl));
        let executor = MutationExecutor::new(Arc::clone(&store), config.operation_timeout);
        let queue = QueueManager::new(executor, Arc::clone(&cache), &config);

        Self {
            store,
            cache,
            queue,
            query_timeout: config.operation_timeout,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &BalanceCache {
        &self.cache
    }

    /// Number of live wallet lanes
    pub fn lane_count(&self) -> usize {
        self.queue.lane_count()
    }

    /// Apply a mutation and wait for its committed balance
    pub async fn apply(&self, request: OperationRequest) -> OperationResult {
        self.queue.enqueue(request).await
    }

    /// Hand a mutation to its lane without waiting for the result
    pub async fn submit(&self, request: OperationRequest) -> Result<PendingOperation, WalletError> {
        self.queue.submit(request).await
    }

    /// Current balance of a wallet, served from the cache when fresh
    ///
    /// # Errors
    ///
    /// * `WalletError::WalletNotFound` - the wallet has never been written
    /// * `WalletError::QueryFailure` - the store read failed or timed out
    pub async fn balance(&self, wallet_id: WalletId) -> Result<BalanceReading, WalletError> {
        if let Some(balance) = self.cache.get(wallet_id) {
            return Ok(BalanceReading {
                wallet_id,
                balance,
                cached: true,
            });
        }

        let deadline = Instant::now() + self.query_timeout;
        let balance = within(deadline, self.store.read_balance(wallet_id))
            .await
            .map_err(|source| match source {
                StoreError::NotFound => WalletError::wallet_not_found(wallet_id),
                source => WalletError::QueryFailure { wallet_id, source },
            })?;
        self.cache.set(wallet_id, balance);

        Ok(BalanceReading {
            wallet_id,
            balance,
            cached: false,
        })
    }

    /// Every stored wallet, sorted by id
    pub async fn wallets(&self) -> Result<Vec<Wallet>, StoreError> {
        let mut wallets = self.store.wallets().await?;
        wallets.sort_by_key(|wallet| wallet.wallet_id);
        Ok(wallets)
    }
}
