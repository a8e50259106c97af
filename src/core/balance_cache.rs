//! Short-lived read-through cache of wallet balances
//!
//! Only the balance query path populates the cache. The mutation path never
//! stores a value; a lane worker calls [`BalanceCache::invalidate`] after every
//! successful commit, before the result reaches the submitter.
//!
//! Entries are immutable once stored: `set` replaces, `invalidate` removes.
//! Expired entries are evicted when a `get` runs into them; there is no
//! background sweep.

use std::time::Duration;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::time::Instant;

use crate::types::WalletId;

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    balance: Decimal,
    expires_at: Instant,
}

/// Thread-safe TTL cache keyed by wallet
#[derive(Debug)]
pub struct BalanceCache {
    entries: DashMap<WalletId, CacheEntry>,
    ttl: Duration,
}

impl BalanceCache {
    /// Create an empty cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Cached balance for a wallet, if present and not yet expired
    pub fn get(&self, wallet_id: WalletId) -> Option<Decimal> {
        let now = Instant::now();
        let entry = *self.entries.get(&wallet_id)?;
        if now < entry.expires_at {
            return Some(entry.balance);
        }

        // Only drop the entry we judged stale; a concurrent `set` may have
        // replaced it in the meantime.
        self.entries
            .remove_if(&wallet_id, |_, current| current.expires_at <= now);
        None
    }

    /// Store a fresh entry expiring `ttl` from now
    pub fn set(&self, wallet_id: WalletId, balance: Decimal) {
        self.entries.insert(
            wallet_id,
            CacheEntry {
                balance,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drop any entry for the wallet
    pub fn invalidate(&self, wallet_id: WalletId) {
        self.entries.remove(&wallet_id);
    }

    /// Number of entries, expired ones included until they are next read
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = BalanceCache::new(Duration::from_secs(10));
        let id = Uuid::new_v4();

        cache.set(id, Decimal::from(123));
        assert_eq!(cache.get(id), Some(Decimal::from(123)));
    }

    #[tokio::test]
    async fn test_get_missing_wallet() {
        let cache = BalanceCache::new(Duration::from_secs(10));
        assert_eq!(cache.get(Uuid::new_v4()), None);
    }

    #[tokio::test]
    async fn test_invalidate_removes_entry() {
        let cache = BalanceCache::new(Duration::from_secs(10));
        let id = Uuid::new_v4();

        cache.set(id, Decimal::from(50));
        cache.invalidate(id);
        assert_eq!(cache.get(id), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = BalanceCache::new(Duration::from_secs(10));
        let id = Uuid::new_v4();
        cache.set(id, Decimal::from(77));

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(cache.get(id), Some(Decimal::from(77)));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get(id), None);
        // Evicted on access
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_refreshes_expiry() {
        let cache = BalanceCache::new(Duration::from_secs(10));
        let id = Uuid::new_v4();
        cache.set(id, Decimal::from(1));

        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set(id, Decimal::from(2));

        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get(id), Some(Decimal::from(2)));
    }
}
