//! In-process transactional balance store
//!
//! `MemoryStore` implements the [`Store`] / [`StoreTransaction`] contract
//! entirely in memory so the engine can run without an external database.
//!
//! # Design
//!
//! - Committed rows live in a `DashMap<WalletId, Decimal>`.
//! - Every row has an async mutex in a second `DashMap`. `read_for_update`,
//!   `insert` and `update` take the row's mutex with `lock_owned` and the
//!   transaction keeps the guard until it commits, rolls back or is dropped.
//!   Locks exist for absent rows too, so two transactions racing to create the
//!   same wallet are serialized. When a transaction ends it drops its guards
//!   and removes every lock nobody else is holding or waiting for, so the lock
//!   map only covers rows in use.
//! - Writes are staged inside the transaction and copied into the committed
//!   map on commit. Nothing staged is visible to `read_balance`.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::traits::{Store, StoreTransaction};
use crate::types::{to_balance_scale, StoreError, Wallet, WalletId};

#[derive(Debug, Default)]
struct Tables {
    /// Committed balances by wallet
    rows: DashMap<WalletId, Decimal>,

    /// Exclusive row locks by wallet
    locks: DashMap<WalletId, Arc<Mutex<()>>>,
}

impl Tables {
    /// Clone the lock handle for a row, creating it on first use
    ///
    /// The map guard is released before returning so no shard lock is held
    /// while the caller awaits the row mutex.
    fn row_lock(&self, wallet_id: WalletId) -> Arc<Mutex<()>> {
        self.locks
            .entry(wallet_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop a row lock entry unless another transaction still holds a handle
    ///
    /// Runs under the shard write lock, so a concurrent `row_lock` either
    /// cloned the handle first (and the entry stays) or creates a fresh one.
    fn forget_lock(&self, wallet_id: WalletId) {
        self.locks
            .remove_if(&wallet_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Thread-safe in-memory store with row-level locking
///
/// Cloning a `MemoryStore` yields another handle onto the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Tables>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a committed row directly, bypassing transactions
    ///
    /// Intended for bootstrapping fixtures.
    pub fn seed(&self, wallet_id: WalletId, balance: Decimal) {
        self.tables
            .rows
            .insert(wallet_id, to_balance_scale(balance));
    }

    /// Number of committed rows
    pub fn len(&self) -> usize {
        self.tables.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.rows.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn lock_count(&self) -> usize {
        self.tables.locks.len()
    }
}

impl Store for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction, StoreError> {
        Ok(MemoryTransaction {
            tables: Arc::clone(&self.tables),
            held: HashMap::new(),
            staged: HashMap::new(),
        })
    }

    async fn read_balance(&self, wallet_id: WalletId) -> Result<Decimal, StoreError> {
        self.tables
            .rows
            .get(&wallet_id)
            .map(|row| *row.value())
            .ok_or(StoreError::NotFound)
    }

    async fn wallets(&self) -> Result<Vec<Wallet>, StoreError> {
        Ok(self
            .tables
            .rows
            .iter()
            .map(|row| Wallet {
                wallet_id: *row.key(),
                balance: *row.value(),
            })
            .collect())
    }
}

/// Open transaction against a [`MemoryStore`]
#[derive(Debug)]
pub struct MemoryTransaction {
    tables: Arc<Tables>,

    /// Row locks held until the transaction ends
    held: HashMap<WalletId, OwnedMutexGuard<()>>,

    /// Writes not yet visible outside this transaction
    staged: HashMap<WalletId, Decimal>,
}

impl MemoryTransaction {
    async fn lock_row(&mut self, wallet_id: WalletId) {
        if self.held.contains_key(&wallet_id) {
            return;
        }
        let lock = self.tables.row_lock(wallet_id);
        let guard = lock.lock_owned().await;
        self.held.insert(wallet_id, guard);
    }

    /// Release every row lock and prune the ones left unused
    fn release(&mut self) {
        for (wallet_id, guard) in self.held.drain() {
            drop(guard);
            self.tables.forget_lock(wallet_id);
        }
    }

    /// Balance as seen from inside this transaction
    fn visible(&self, wallet_id: WalletId) -> Option<Decimal> {
        self.staged.get(&wallet_id).copied().or_else(|| {
            self.tables
                .rows
                .get(&wallet_id)
                .map(|row| *row.value())
        })
    }
}

impl StoreTransaction for MemoryTransaction {
    async fn read_for_update(&mut self, wallet_id: WalletId) -> Result<Decimal, StoreError> {
        self.lock_row(wallet_id).await;
        self.visible(wallet_id).ok_or(StoreError::NotFound)
    }

    async fn insert(&mut self, wallet_id: WalletId, balance: Decimal) -> Result<(), StoreError> {
        self.lock_row(wallet_id).await;
        if self.visible(wallet_id).is_some() {
            return Err(StoreError::AlreadyExists);
        }
        self.staged.insert(wallet_id, to_balance_scale(balance));
        Ok(())
    }

    async fn update(&mut self, wallet_id: WalletId, balance: Decimal) -> Result<(), StoreError> {
        self.lock_row(wallet_id).await;
        if self.visible(wallet_id).is_none() {
            return Err(StoreError::NotFound);
        }
        self.staged.insert(wallet_id, to_balance_scale(balance));
        Ok(())
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        for (wallet_id, balance) in self.staged.drain() {
            self.tables.rows.insert(wallet_id, balance);
        }
        self.release();
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), StoreError> {
        self.staged.clear();
        self.release();
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        self.release();
    }
}
