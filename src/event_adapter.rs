//! Realtime event adapter
//!
//! Folds server-pushed confirmation events into the per-conversation
//! confirmation-card state and marks the affected contract record stale so
//! the projector recomputes from a fresh snapshot.
//!
//! Delivery on the realtime channel is at-least-once and unordered, so the
//! fold enforces supersession: once a card is final for a contract id, any
//! later non-final event for the same id is ignored.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::contract_cache::ContractCache;
use crate::models::{ActionParty, ConfirmationCardState, RealtimeEvent};

const CARD_CHANNEL_CAPACITY: usize = 64;

pub struct EventAdapter {
    cache: Arc<ContractCache>,
    /// Conversations with a mounted chat view. Events for anything else are
    /// ignored; the relevant view simply isn't open.
    mounted: RwLock<HashSet<Uuid>>,
    cards: RwLock<HashMap<Uuid, ConfirmationCardState>>,
    card_changes: broadcast::Sender<Uuid>,
}

impl EventAdapter {
    pub fn new(cache: Arc<ContractCache>) -> Self {
        let (card_changes, _) = broadcast::channel(CARD_CHANNEL_CAPACITY);
        Self {
            cache,
            mounted: RwLock::new(HashSet::new()),
            cards: RwLock::new(HashMap::new()),
            card_changes,
        }
    }

    /// Register a conversation whose chat view is open.
    pub async fn mount(&self, conversation_id: Uuid) {
        self.mounted.write().await.insert(conversation_id);
    }

    /// Drop a conversation's card state when its view closes. The card is
    /// session-scoped; nothing is persisted.
    pub async fn unmount(&self, conversation_id: Uuid) {
        self.mounted.write().await.remove(&conversation_id);
        self.cards.write().await.remove(&conversation_id);
    }

    pub async fn card(&self, conversation_id: Uuid) -> Option<ConfirmationCardState> {
        self.cards.read().await.get(&conversation_id).cloned()
    }

    /// Notified with the conversation id whenever a card changes.
    pub fn subscribe_cards(&self) -> broadcast::Receiver<Uuid> {
        self.card_changes.subscribe()
    }

    /// Fold one realtime event into local state.
    pub async fn apply(&self, event: RealtimeEvent) {
        let conversation_id = event.conversation_id();
        if !self.mounted.read().await.contains(&conversation_id) {
            tracing::debug!(%conversation_id, "event for unmounted conversation ignored");
            return;
        }

        match event {
            RealtimeEvent::ConfirmationRequested {
                contract_id,
                action_party,
                ..
            } => {
                let mut cards = self.cards.write().await;
                if let Some(existing) = cards.get(&conversation_id) {
                    // Out-of-order delivery: a request must never overwrite
                    // an already-final card for the same contract.
                    if existing.contract_id == contract_id && existing.is_final {
                        tracing::debug!(
                            %contract_id,
                            "late confirmation_requested superseded by final card"
                        );
                        return;
                    }
                }
                cards.insert(
                    conversation_id,
                    ConfirmationCardState {
                        contract_id,
                        action_party,
                        is_final: false,
                        pdf_url: None,
                        timestamp: None,
                    },
                );
                drop(cards);
                tracing::info!(%conversation_id, %contract_id, "confirmation requested");
                let _ = self.card_changes.send(conversation_id);
            }
            RealtimeEvent::ConfirmationComplete {
                contract_id,
                pdf_url,
                timestamp,
                ..
            } => {
                {
                    let mut cards = self.cards.write().await;
                    let action_party = cards
                        .get(&conversation_id)
                        .filter(|card| card.contract_id == contract_id)
                        .map(|card| card.action_party)
                        .unwrap_or(ActionParty::Seller);
                    cards.insert(
                        conversation_id,
                        ConfirmationCardState {
                            contract_id,
                            action_party,
                            is_final: true,
                            pdf_url,
                            timestamp: Some(timestamp),
                        },
                    );
                }
                tracing::info!(%conversation_id, %contract_id, "confirmation complete");
                // The record now reads SUCCESS server-side; refetch rather
                // than patching status locally.
                self.cache.invalidate(contract_id).await;
                let _ = self.card_changes.send(conversation_id);
            }
        }
    }
}
