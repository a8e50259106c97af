//! Per-wallet operation serializer
//!
//! `QueueManager` owns one lane per wallet: a bounded tokio `mpsc` channel
//! drained by exactly one worker task. Requests for the same wallet run one
//! at a time in the order they were accepted into the lane; lanes for
//! different wallets run in parallel with no global lock.
//!
//! # Architecture
//!
//! ```text
//! submit(request)
//!     └── lanes: DashMap<WalletId, Lane>   (lookup, or create + spawn worker)
//!             └── mpsc::Sender<LaneTask> ──> worker loop
//!                                              ├── MutationExecutor::execute
//!                                              ├── BalanceCache::invalidate (success only)
//!                                              └── oneshot reply to the submitter
//! ```
//!
//! # Lane lifecycle
//!
//! Lanes are created on the first request for a wallet. Creation happens
//! inside `DashMap::entry`, under the shard write lock, so concurrent
//! first-time submissions for one wallet converge on a single lane and a
//! single worker.
//!
//! With an idle timeout configured, a worker that receives nothing for that
//! long tries to retire. It removes its registry entry only if, under the
//! shard lock, its queue is empty and the registry holds the last sender
//! (no submitter is between lookup and send). The next request recreates the
//! lane. Without an idle timeout lanes live as long as the manager.
//!
//! # Back-pressure
//!
//! A full lane makes the submitter wait up to the configured enqueue timeout,
//! then fail with `WalletError::LaneFull`. A zero timeout fails immediately.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc::error::{SendTimeoutError, TrySendError};
use tokio::sync::{mpsc, oneshot};

use super::balance_cache::BalanceCache;
use super::config::EngineConfig;
use super::executor::MutationExecutor;
use super::traits::Store;
use crate::types::{OperationRequest, OperationResult, WalletError, WalletId};

/// One queued request and the channel its result goes back on
#[derive(Debug)]
struct LaneTask {
    request: OperationRequest,
    reply: oneshot::Sender<OperationResult>,
}

/// Registry entry for a live lane
#[derive(Debug)]
struct Lane {
    sender: mpsc::Sender<LaneTask>,
    generation: u64,
}

/// Why a task could not be placed on a lane
enum SendFailure {
    Full,
    Closed(LaneTask),
}

/// A request accepted into its lane, waiting for the worker
#[derive(Debug)]
pub struct PendingOperation {
    wallet_id: WalletId,
    outcome: oneshot::Receiver<OperationResult>,
}

impl PendingOperation {
    /// Wait for the lane worker to process the request
    pub async fn outcome(self) -> OperationResult {
        let wallet_id = self.wallet_id;
        self.outcome
            .await
            .unwrap_or_else(|_| Err(WalletError::lane_closed(wallet_id)))
    }
}

#[derive(Debug)]
struct Shared<S> {
    lanes: DashMap<WalletId, Lane>,
    executor: MutationExecutor<S>,
    cache: Arc<BalanceCache>,
    capacity: usize,
    enqueue_timeout: Duration,
    idle_timeout: Option<Duration>,
    generations: AtomicU64,
}

/// Serializes operations per wallet
pub struct QueueManager<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for QueueManager<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: Store> QueueManager<S> {
    /// Create a manager with no lanes
    ///
    /// Lane capacity, enqueue timeout and idle timeout come from `config`.
    pub fn new(
        executor: MutationExecutor<S>,
        cache: Arc<BalanceCache>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                lanes: DashMap::new(),
                executor,
                cache,
                capacity: config.lane_capacity.max(1),
                enqueue_timeout: config.enqueue_timeout,
                idle_timeout: config.lane_idle_timeout,
                generations: AtomicU64::new(0),
            }),
        }
    }

    /// Number of live lanes
    pub fn lane_count(&self) -> usize {
        self.shared.lanes.len()
    }

    /// Submit a request and wait for its result
    pub async fn enqueue(&self, request: OperationRequest) -> OperationResult {
        self.submit(request).await?.outcome().await
    }

    /// Place a request on its wallet's lane
    ///
    /// Returns as soon as the request is accepted. Requests submitted one
    /// after another for the same wallet are processed in that order.
    ///
    /// # Errors
    ///
    /// * `WalletError::LaneFull` - no room in the lane within the enqueue timeout
    pub async fn submit(&self, request: OperationRequest) -> Result<PendingOperation, WalletError> {
        let wallet_id = request.wallet_id();
        let (reply, outcome) = oneshot::channel();
        let mut task = LaneTask { request, reply };

        loop {
            let (sender, generation) = self.lane(wallet_id);
            match self.send(&sender, task).await {
                Ok(()) => return Ok(PendingOperation { wallet_id, outcome }),
                Err(SendFailure::Full) => {
                    tracing::warn!(%wallet_id, "Lane full, rejecting request");
                    return Err(WalletError::lane_full(wallet_id));
                }
                Err(SendFailure::Closed(returned)) => {
                    // The worker is gone without retiring its entry; replace the lane.
                    drop(sender);
                    self.shared
                        .lanes
                        .remove_if(&wallet_id, |_, lane| lane.generation == generation);
                    task = returned;
                }
            }
        }
    }

    /// Sender for a wallet's lane, creating the lane on first use
    fn lane(&self, wallet_id: WalletId) -> (mpsc::Sender<LaneTask>, u64) {
        if let Some(lane) = self.shared.lanes.get(&wallet_id) {
            return (lane.sender.clone(), lane.generation);
        }

        let lane = self
            .shared
            .lanes
            .entry(wallet_id)
            .or_insert_with(|| self.spawn_lane(wallet_id));
        (lane.sender.clone(), lane.generation)
    }

    fn spawn_lane(&self, wallet_id: WalletId) -> Lane {
        let (sender, receiver) = mpsc::channel(self.shared.capacity);
        let generation = self.shared.generations.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(%wallet_id, generation, "Starting lane");
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move { shared.run_lane(wallet_id, generation, receiver).await });

        Lane { sender, generation }
    }

    async fn send(
        &self,
        sender: &mpsc::Sender<LaneTask>,
        task: LaneTask,
    ) -> Result<(), SendFailure> {
        if self.shared.enqueue_timeout.is_zero() {
            return sender.try_send(task).map_err(|e| match e {
                TrySendError::Full(_) => SendFailure::Full,
                TrySendError::Closed(task) => SendFailure::Closed(task),
            });
        }

        sender
            .send_timeout(task, self.shared.enqueue_timeout)
            .await
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => SendFailure::Full,
                SendTimeoutError::Closed(task) => SendFailure::Closed(task),
            })
    }
}

impl<S: Store> Shared<S> {
    /// Worker loop: one task at a time until the lane retires
    async fn run_lane(
        self: Arc<Self>,
        wallet_id: WalletId,
        generation: u64,
        mut receiver: mpsc::Receiver<LaneTask>,
    ) {
        loop {
            let next = match self.idle_timeout {
                None => receiver.recv().await,
                Some(idle) => match tokio::time::timeout(idle, receiver.recv()).await {
                    Ok(next) => next,
                    Err(_) => {
                        if self.retire(wallet_id, generation, &receiver) {
                            break;
                        }
                        continue;
                    }
                },
            };

            match next {
                Some(task) => self.process(task).await,
                None => break,
            }
        }

        tracing::debug!(%wallet_id, generation, "Lane retired");
    }

    /// Remove this lane from the registry if nobody can still reach it
    fn retire(&self, wallet_id: WalletId, generation: u64, receiver: &mpsc::Receiver<LaneTask>) -> bool {
        self.lanes
            .remove_if(&wallet_id, |_, lane| {
                lane.generation == generation
                    && lane.sender.strong_count() == 1
                    && receiver.is_empty()
            })
            .is_some()
    }

    async fn process(&self, task: LaneTask) {
        let LaneTask { request, reply } = task;
        let wallet_id = request.wallet_id();

        let result = self.executor.execute(&request).await;
        match &result {
            Ok(balance) => {
                // Must happen before the reply: any entry cached before the
                // commit is gone by the time the submitter sees the result.
                self.cache.invalidate(wallet_id);
                tracing::trace!(
                    %wallet_id,
                    kind = %request.kind(),
                    amount = %request.amount(),
                    %balance,
                    "Operation committed"
                );
            }
            Err(err) if err.kind().is_client_error() => {
                tracing::debug!(%wallet_id, kind = %err.kind(), "Operation rejected: {}", err);
            }
            Err(err) => {
                tracing::warn!(%wallet_id, kind = %err.kind(), "Operation failed: {}", err);
            }
        }

        if reply.send(result).is_err() {
            tracing::debug!(%wallet_id, "Submitter dropped before the result was delivered");
        }
    }
}
