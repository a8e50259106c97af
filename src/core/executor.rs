//! Transactional read-modify-write of a single wallet balance
//!
//! `MutationExecutor` runs one [`OperationRequest`] as one store transaction:
//!
//! 1. begin
//! 2. read the balance under an exclusive row lock, inserting a zero row if
//!    the wallet does not exist yet
//! 3. apply the operation ([`OperationRequest::apply_to`])
//! 4. update the row
//! 5. commit
//!
//! Any failure after `begin` rolls the transaction back, so a rejected or
//! failed request never leaves a partial write behind. Every store call runs
//! under one deadline computed from the configured operation timeout; a step
//! that misses it fails with `StoreError::Timeout` as its source.
//!
//! The executor never retries.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::time::Instant;

use super::traits::{Store, StoreTransaction};
use crate::types::{
    to_balance_scale, OperationRequest, OperationResult, StoreError, WalletError,
};

/// Await a store call, giving up at `deadline`
pub(super) async fn within<T, F>(deadline: Instant, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout_at(deadline, call)
        .await
        .unwrap_or(Err(StoreError::Timeout))
}

/// Applies operation requests against a [`Store`]
#[derive(Debug)]
pub struct MutationExecutor<S> {
    store: Arc<S>,
    timeout: Duration,
}

impl<S> Clone for MutationExecutor<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            timeout: self.timeout,
        }
    }
}

impl<S: Store> MutationExecutor<S> {
    /// Create an executor whose transactions must finish within `timeout`
    pub fn new(store: Arc<S>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Run one request as one transaction
    ///
    /// # Returns
    ///
    /// * `Ok(balance)` - the committed balance after the operation
    /// * `Err(WalletError)` - classified failure; the transaction was rolled back
    pub async fn execute(&self, request: &OperationRequest) -> OperationResult {
        let wallet_id = request.wallet_id();
        let deadline = Instant::now() + self.timeout;

        let mut tx = within(deadline, self.store.begin())
            .await
            .map_err(|source| WalletError::TransactionStart { wallet_id, source })?;

        let (balance, next) = match Self::mutate(&mut tx, request, deadline).await {
            Ok(change) => change,
            Err(err) => {
                self.abort(tx, request).await;
                return Err(err);
            }
        };

        // A commit that misses the deadline is dropped mid-flight, which
        // releases the transaction without applying it.
        within(deadline, tx.commit())
            .await
            .map_err(|source| WalletError::CommitFailure {
                wallet_id,
                balance,
                source,
            })?;

        Ok(next)
    }

    /// Steps 2-4, returning the balance before and after the operation
    async fn mutate(
        tx: &mut S::Tx,
        request: &OperationRequest,
        deadline: Instant,
    ) -> Result<(Decimal, Decimal), WalletError> {
        let wallet_id = request.wallet_id();

        let balance = match within(deadline, tx.read_for_update(wallet_id)).await {
            Ok(balance) => balance,
            Err(StoreError::NotFound) => {
                let opening = to_balance_scale(Decimal::ZERO);
                within(deadline, tx.insert(wallet_id, opening))
                    .await
                    .map_err(|source| WalletError::CreateFailure { wallet_id, source })?;
                opening
            }
            Err(source) => return Err(WalletError::ReadFailure { wallet_id, source }),
        };

        let next = request.apply_to(balance)?;

        within(deadline, tx.update(wallet_id, next))
            .await
            .map_err(|source| WalletError::WriteFailure {
                wallet_id,
                balance,
                source,
            })?;

        Ok((balance, next))
    }

    async fn abort(&self, tx: S::Tx, request: &OperationRequest) {
        match tokio::time::timeout(self.timeout, tx.rollback()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(
                wallet_id = %request.wallet_id(),
                error = %e,
                "Failed to rollback transaction"
            ),
            Err(_) => tracing::warn!(
                wallet_id = %request.wallet_id(),
                "Rollback timed out, transaction dropped"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MemoryStore;
    use crate::types::{ErrorKind, Wallet, WalletId};
    use std::str::FromStr;
    use std::sync::Mutex;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn executor(store: &MemoryStore) -> MutationExecutor<MemoryStore> {
        MutationExecutor::new(Arc::new(store.clone()), Duration::from_secs(5))
    }

    /// Store step to sabotage in [`FaultyStore`]
    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Step {
        Begin,
        Read,
        Insert,
        Update,
        Commit,
        HangOnRead,
    }

    /// Wraps a `MemoryStore`, failing one step and recording rollbacks
    #[derive(Debug)]
    struct FaultyStore {
        inner: MemoryStore,
        fail: Step,
        rollbacks: Arc<Mutex<u32>>,
    }

    struct FaultyTx {
        inner: <MemoryStore as Store>::Tx,
        fail: Step,
        rollbacks: Arc<Mutex<u32>>,
    }

    fn boom() -> StoreError {
        StoreError::Backend("injected".to_string())
    }

    impl Store for FaultyStore {
        type Tx = FaultyTx;

        async fn begin(&self) -> Result<FaultyTx, StoreError> {
            if self.fail == Step::Begin {
                return Err(boom());
            }
            Ok(FaultyTx {
                inner: self.inner.begin().await?,
                fail: self.fail,
                rollbacks: Arc::clone(&self.rollbacks),
            })
        }

        async fn read_balance(&self, wallet_id: WalletId) -> Result<Decimal, StoreError> {
            self.inner.read_balance(wallet_id).await
        }

        async fn wallets(&self) -> Result<Vec<Wallet>, StoreError> {
            self.inner.wallets().await
        }
    }

    impl StoreTransaction for FaultyTx {
        async fn read_for_update(&mut self, wallet_id: WalletId) -> Result<Decimal, StoreError> {
            match self.fail {
                Step::Read => Err(boom()),
                Step::HangOnRead => std::future::pending().await,
                _ => self.inner.read_for_update(wallet_id).await,
            }
        }

        async fn insert(&mut self, wallet_id: WalletId, balance: Decimal) -> Result<(), StoreError> {
            if self.fail == Step::Insert {
                return Err(boom());
            }
            self.inner.insert(wallet_id, balance).await
        }

        async fn update(&mut self, wallet_id: WalletId, balance: Decimal) -> Result<(), StoreError> {
            if self.fail == Step::Update {
                return Err(boom());
            }
            self.inner.update(wallet_id, balance).await
        }

        async fn commit(self) -> Result<(), StoreError> {
            if self.fail == Step::Commit {
                return Err(boom());
            }
            self.inner.commit().await
        }

        async fn rollback(self) -> Result<(), StoreError> {
            *self.rollbacks.lock().unwrap() += 1;
            self.inner.rollback().await
        }
    }

    fn faulty(fail: Step, timeout: Duration) -> (MemoryStore, Arc<Mutex<u32>>, MutationExecutor<FaultyStore>) {
        let inner = MemoryStore::new();
        let rollbacks = Arc::new(Mutex::new(0));
        let store = FaultyStore {
            inner: inner.clone(),
            fail,
            rollbacks: Arc::clone(&rollbacks),
        };
        (inner, rollbacks, MutationExecutor::new(Arc::new(store), timeout))
    }

    #[tokio::test]
    async fn test_deposit_creates_wallet() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();

        let request = OperationRequest::deposit(id, dec("1000000")).unwrap();
        let balance = executor(&store).execute(&request).await.unwrap();

        assert_eq!(balance.to_string(), "1000000.0000");
        assert_eq!(store.read_balance(id).await.unwrap(), dec("1000000"));
    }

    #[tokio::test]
    async fn test_withdraw_from_fresh_wallet_persists_nothing() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();

        let request = OperationRequest::withdraw(id, dec("10")).unwrap();
        let err = executor(&store).execute(&request).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(err.balance().unwrap().to_string(), "0.0000");
        assert_eq!(store.read_balance(id).await, Err(StoreError::NotFound));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_withdraw_exact_balance_leaves_zero() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.seed(id, dec("25.5"));

        let request = OperationRequest::withdraw(id, dec("25.5")).unwrap();
        let balance = executor(&store).execute(&request).await.unwrap();

        assert_eq!(balance, Decimal::ZERO);
        assert_eq!(store.read_balance(id).await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_insufficient_funds_leaves_row_unchanged() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.seed(id, dec("5"));

        let request = OperationRequest::withdraw(id, dec("5.0001")).unwrap();
        let err = executor(&store).execute(&request).await.unwrap_err();

        assert_eq!(err.balance(), Some(dec("5")));
        assert_eq!(store.read_balance(id).await.unwrap(), dec("5"));
    }

    #[rstest::rstest]
    #[case::begin(Step::Begin, ErrorKind::TransactionStartFailure, 0)]
    #[case::read(Step::Read, ErrorKind::ReadFailure, 1)]
    #[case::insert(Step::Insert, ErrorKind::CreateFailure, 1)]
    #[case::update(Step::Update, ErrorKind::WriteFailure, 1)]
    #[case::commit(Step::Commit, ErrorKind::CommitFailure, 0)]
    #[tokio::test]
    async fn test_store_failures_are_classified(
        #[case] step: Step,
        #[case] expected: ErrorKind,
        #[case] expected_rollbacks: u32,
    ) {
        let (inner, rollbacks, executor) = faulty(step, Duration::from_secs(5));
        let id = Uuid::new_v4();

        let request = OperationRequest::deposit(id, dec("3")).unwrap();
        let err = executor.execute(&request).await.unwrap_err();

        assert_eq!(err.kind(), expected);
        assert_eq!(err.wallet_id(), id);
        assert_eq!(*rollbacks.lock().unwrap(), expected_rollbacks);
        assert!(inner.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_read_times_out_and_rolls_back() {
        let (inner, rollbacks, executor) = faulty(Step::HangOnRead, Duration::from_millis(200));
        let id = Uuid::new_v4();
        inner.seed(id, dec("1"));

        let request = OperationRequest::deposit(id, dec("1")).unwrap();
        let err = executor.execute(&request).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ReadFailure);
        assert_eq!(err.store_error(), Some(&StoreError::Timeout));
        assert_eq!(*rollbacks.lock().unwrap(), 1);
        assert_eq!(inner.read_balance(id).await.unwrap(), dec("1"));
    }
}
