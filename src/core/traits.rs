//! Durable store abstractions
//!
//! The engine never talks to a concrete database. It drives these two traits,
//! which model a transactional store with exclusive row locks
//! (`SELECT ... FOR UPDATE` semantics). [`MemoryStore`](super::MemoryStore)
//! is the in-process implementation shipped with the crate.
//!
//! Methods return `impl Future + Send` so lane workers can run on a
//! multi-threaded runtime without knowing the concrete store type.

use std::future::Future;

use rust_decimal::Decimal;

use crate::types::{StoreError, Wallet, WalletId};

/// A transactional balance store shared by every lane worker
pub trait Store: Send + Sync + 'static {
    /// Transaction handle produced by [`Store::begin`]
    type Tx: StoreTransaction;

    /// Open a new transaction
    fn begin(&self) -> impl Future<Output = Result<Self::Tx, StoreError>> + Send;

    /// Read the committed balance without taking any lock
    ///
    /// Returns `StoreError::NotFound` if the wallet has no row.
    fn read_balance(
        &self,
        wallet_id: WalletId,
    ) -> impl Future<Output = Result<Decimal, StoreError>> + Send;

    /// Snapshot of all committed rows, in no particular order
    fn wallets(&self) -> impl Future<Output = Result<Vec<Wallet>, StoreError>> + Send;
}

/// One open store transaction
///
/// Dropping a transaction without calling [`commit`](StoreTransaction::commit)
/// must discard its writes and release its row locks, the same as
/// [`rollback`](StoreTransaction::rollback).
pub trait StoreTransaction: Send {
    /// Read a balance and hold an exclusive lock on its row until the
    /// transaction ends
    ///
    /// A missing row is reported as `StoreError::NotFound`, distinguishable
    /// from every other failure.
    fn read_for_update(
        &mut self,
        wallet_id: WalletId,
    ) -> impl Future<Output = Result<Decimal, StoreError>> + Send;

    /// Insert a new row
    fn insert(
        &mut self,
        wallet_id: WalletId,
        balance: Decimal,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Overwrite the balance of an existing row
    fn update(
        &mut self,
        wallet_id: WalletId,
        balance: Decimal,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Make every write of this transaction visible and release its locks
    fn commit(self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Discard every write of this transaction and release its locks
    fn rollback(self) -> impl Future<Output = Result<(), StoreError>> + Send;
}
