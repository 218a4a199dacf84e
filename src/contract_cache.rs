//! Shared contract record cache
//!
//! One record per contract id, shared read-only across every surface
//! subscribed to it. Surfaces never patch fields locally; a mutation stores
//! the server-returned snapshot or invalidates the entry so the next read
//! refetches. Change notifications fan out over a broadcast channel so both
//! surfaces re-render from the same record.

use std::collections::HashMap;

use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::models::Contract;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Cache change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheChange {
    Updated(Uuid),
    /// The record is stale; subscribers should refetch before rendering
    /// actions for this contract.
    Invalidated(Uuid),
}

pub struct ContractCache {
    records: RwLock<HashMap<Uuid, Contract>>,
    changes: broadcast::Sender<CacheChange>,
}

impl Default for ContractCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ContractCache {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            records: RwLock::new(HashMap::new()),
            changes,
        }
    }

    pub async fn get(&self, id: Uuid) -> Option<Contract> {
        self.records.read().await.get(&id).cloned()
    }

    /// Store a server-confirmed snapshot.
    ///
    /// Confirmation timestamps are monotonic from the client's perspective:
    /// a snapshot that would clear an already-set timestamp (a stale read
    /// overtaking a fresh one) keeps the previously observed value.
    pub async fn store(&self, mut contract: Contract) {
        let id = contract.id;
        {
            let mut records = self.records.write().await;
            if let Some(previous) = records.get(&id) {
                if previous.buyer_confirmed_at.is_some() && contract.buyer_confirmed_at.is_none() {
                    tracing::warn!(contract_id = %id, "stale snapshot would clear buyer confirmation; keeping");
                    contract.buyer_confirmed_at = previous.buyer_confirmed_at;
                }
                if previous.seller_confirmed_at.is_some() && contract.seller_confirmed_at.is_none()
                {
                    tracing::warn!(contract_id = %id, "stale snapshot would clear seller confirmation; keeping");
                    contract.seller_confirmed_at = previous.seller_confirmed_at;
                }
                if previous.confirmed_at.is_some() && contract.confirmed_at.is_none() {
                    contract.confirmed_at = previous.confirmed_at;
                }
            }
            records.insert(id, contract);
        }
        let _ = self.changes.send(CacheChange::Updated(id));
    }

    /// Drop the record so the next read goes back to the server.
    pub async fn invalidate(&self, id: Uuid) {
        self.records.write().await.remove(&id);
        let _ = self.changes.send(CacheChange::Invalidated(id));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContractStatus;
    use chrono::Utc;

    fn test_contract(id: Uuid) -> Contract {
        Contract {
            id,
            listing_id: Uuid::new_v4(),
            buyer_id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            status: ContractStatus::AwaitingConfirmation,
            buyer_confirmed_at: None,
            seller_confirmed_at: None,
            confirmed_at: None,
            is_external_transaction: false,
            fee_rate: None,
        }
    }

    #[tokio::test]
    async fn store_then_get() {
        let cache = ContractCache::new();
        let id = Uuid::new_v4();
        cache.store(test_contract(id)).await;
        assert!(cache.get(id).await.is_some());
    }

    #[tokio::test]
    async fn invalidate_removes_record_and_notifies() {
        let cache = ContractCache::new();
        let id = Uuid::new_v4();
        cache.store(test_contract(id)).await;

        let mut changes = cache.subscribe();
        cache.invalidate(id).await;
        assert!(cache.get(id).await.is_none());
        assert_eq!(changes.recv().await.unwrap(), CacheChange::Invalidated(id));
    }

    #[tokio::test]
    async fn stale_snapshot_cannot_clear_confirmations() {
        let cache = ContractCache::new();
        let id = Uuid::new_v4();

        let mut confirmed = test_contract(id);
        confirmed.buyer_confirmed_at = Some(Utc::now());
        cache.store(confirmed).await;

        // A late response from before the confirmation lands afterwards.
        cache.store(test_contract(id)).await;

        let record = cache.get(id).await.unwrap();
        assert!(record.buyer_confirmed_at.is_some());
    }

    #[tokio::test]
    async fn store_notifies_subscribers() {
        let cache = ContractCache::new();
        let mut changes = cache.subscribe();
        let id = Uuid::new_v4();
        cache.store(test_contract(id)).await;
        assert_eq!(changes.recv().await.unwrap(), CacheChange::Updated(id));
    }
}
