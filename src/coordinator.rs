//! Order confirmation coordinator
//!
//! Composition root for one signed-in user: wires the contract client, the
//! shared record cache, and the realtime adapter, and owns the two policies
//! the surfaces rely on:
//!
//! - pending gating: an action control is disabled while its mutation is in
//!   flight (no client-side lock, no queueing; the server is the sole
//!   arbiter of conflicting transitions);
//! - error conversion: boundary errors become user notices at the point of
//!   invocation, never render-time errors, and a `Conflict` triggers an
//!   invalidate-and-refetch so the UI converges to the true state.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::contract_cache::ContractCache;
use crate::contract_client::ContractClient;
use crate::error::CoordinatorError;
use crate::event_adapter::EventAdapter;
use crate::models::{ConfirmRequest, Contract, InitiateRequest, TransactionKind};
use crate::projector::{project, ProjectedView};
use crate::surfaces::order::ForfeitTicket;

/// Which surface triggered an action; decides how a `NotFound` is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Chat,
    Order,
}

/// User-facing outcome of a failed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserNotice {
    Toast(String),
    /// Full-page error state on the order surface.
    PageError(String),
}

/// Result of an action trigger as the surface sees it.
#[derive(Debug)]
pub enum ActionOutcome {
    /// Mutation applied; the returned snapshot is already in the cache.
    Completed(Contract),
    /// Mutation accepted with an empty response; the record was marked stale
    /// and the realtime feed (or the next read) brings the update.
    Accepted,
    /// A mutation for this target is already in flight; the control should
    /// have been disabled.
    AlreadyPending,
    /// Mutation rejected. `None` means render nothing (chat-surface
    /// `NotFound`); otherwise show the notice.
    Rejected(Option<UserNotice>),
}

pub struct Coordinator {
    client: ContractClient,
    cache: Arc<ContractCache>,
    adapter: Arc<EventAdapter>,
    current_user_id: Uuid,
    pending: Mutex<HashSet<Uuid>>,
}

impl Coordinator {
    pub fn new(client: ContractClient, current_user_id: Uuid) -> Self {
        let cache = Arc::new(ContractCache::new());
        let adapter = Arc::new(EventAdapter::new(cache.clone()));
        Self {
            client,
            cache,
            adapter,
            current_user_id,
            pending: Mutex::new(HashSet::new()),
        }
    }

    pub fn cache(&self) -> Arc<ContractCache> {
        self.cache.clone()
    }

    pub fn adapter(&self) -> Arc<EventAdapter> {
        self.adapter.clone()
    }

    pub fn current_user_id(&self) -> Uuid {
        self.current_user_id
    }

    /// The contract record plus its projection for the current user, served
    /// from cache or fetched on miss.
    pub async fn contract_view(
        &self,
        contract_id: Uuid,
    ) -> Result<(Contract, ProjectedView), CoordinatorError> {
        let contract = match self.cache.get(contract_id).await {
            Some(contract) => contract,
            None => self.refresh(contract_id).await?,
        };
        let view = project(&contract, self.current_user_id);
        Ok((contract, view))
    }

    /// Fetch a fresh snapshot and store it.
    pub async fn refresh(&self, contract_id: Uuid) -> Result<Contract, CoordinatorError> {
        let contract = self.client.get_contract(contract_id).await?;
        self.cache.store(contract.clone()).await;
        Ok(contract)
    }

    pub fn is_pending(&self, target: Uuid) -> bool {
        self.pending_set().contains(&target)
    }

    /// Seller initiation. `kind` is present when the finalize-order dialog
    /// was used and absent on the direct confirmation-request path. Gated on
    /// the conversation since no contract id exists yet.
    pub async fn initiate(
        &self,
        listing_id: Uuid,
        conversation_id: Uuid,
        kind: Option<TransactionKind>,
        surface: Surface,
    ) -> ActionOutcome {
        if !self.begin(conversation_id) {
            return ActionOutcome::AlreadyPending;
        }
        let request = InitiateRequest {
            transaction_kind: kind,
        };
        let result = self
            .client
            .initiate_confirmation(listing_id, conversation_id, &request)
            .await;
        self.finish(conversation_id);

        match result {
            Ok(()) => ActionOutcome::Accepted,
            Err(error) => self.reject(None, error, surface).await,
        }
    }

    /// Buyer confirmation of receipt, with an optional note.
    pub async fn confirm_as_buyer(
        &self,
        contract_id: Uuid,
        request: ConfirmRequest,
        surface: Surface,
    ) -> ActionOutcome {
        if !self.begin(contract_id) {
            return ActionOutcome::AlreadyPending;
        }
        let result = self.client.confirm_by_buyer(contract_id, &request).await;
        self.finish(contract_id);
        self.settle(contract_id, result, surface).await
    }

    /// Seller confirmation, symmetric to the buyer's.
    pub async fn confirm_as_seller(
        &self,
        contract_id: Uuid,
        request: ConfirmRequest,
        surface: Surface,
    ) -> ActionOutcome {
        if !self.begin(contract_id) {
            return ActionOutcome::AlreadyPending;
        }
        let result = self.client.confirm_by_seller(contract_id, &request).await;
        self.finish(contract_id);
        self.settle(contract_id, result, surface).await
    }

    /// Buyer agree shorthand from the chat confirmation card. The response
    /// is empty, so the record is marked stale; the completion event (or the
    /// next read) converges it.
    pub async fn agree(&self, contract_id: Uuid) -> ActionOutcome {
        if !self.begin(contract_id) {
            return ActionOutcome::AlreadyPending;
        }
        let result = self.client.agree_to_contract(contract_id).await;
        self.finish(contract_id);

        match result {
            Ok(()) => {
                self.cache.invalidate(contract_id).await;
                ActionOutcome::Accepted
            }
            Err(error) => self.reject(Some(contract_id), error, Surface::Chat).await,
        }
    }

    /// Irreversible forfeit. Only reachable with a ticket from the order
    /// dialog's two-stage guard.
    pub async fn forfeit_external(&self, ticket: ForfeitTicket) -> ActionOutcome {
        let contract_id = ticket.contract_id();
        if !self.begin(contract_id) {
            return ActionOutcome::AlreadyPending;
        }
        let result = self.client.forfeit_external(contract_id).await;
        self.finish(contract_id);
        self.settle(contract_id, result, Surface::Order).await
    }

    fn begin(&self, target: Uuid) -> bool {
        self.pending_set().insert(target)
    }

    fn finish(&self, target: Uuid) {
        self.pending_set().remove(&target);
    }

    // A poisoned lock only means a panic elsewhere while the set was held;
    // the set itself stays consistent, so recover rather than propagate.
    fn pending_set(&self) -> std::sync::MutexGuard<'_, HashSet<Uuid>> {
        self.pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    async fn settle(
        &self,
        contract_id: Uuid,
        result: Result<Contract, CoordinatorError>,
        surface: Surface,
    ) -> ActionOutcome {
        match result {
            Ok(contract) => {
                self.cache.store(contract.clone()).await;
                ActionOutcome::Completed(contract)
            }
            Err(error) => self.reject(Some(contract_id), error, surface).await,
        }
    }

    async fn reject(
        &self,
        contract_id: Option<Uuid>,
        error: CoordinatorError,
        surface: Surface,
    ) -> ActionOutcome {
        if let CoordinatorError::Forbidden = error {
            // The projector should have hidden the triggering control.
            tracing::warn!(?contract_id, "forbidden action reached the boundary");
        }
        if error.requires_refetch() {
            if let Some(id) = contract_id {
                if let Err(refetch_error) = self.refresh(id).await {
                    tracing::warn!(contract_id = %id, error = %refetch_error, "refetch after conflict failed");
                }
            }
        }
        ActionOutcome::Rejected(notice_for(&error, surface))
    }
}

/// Convert a boundary error into what the triggering surface shows.
pub fn notice_for(error: &CoordinatorError, surface: Surface) -> Option<UserNotice> {
    match error {
        CoordinatorError::Forbidden => Some(UserNotice::Toast(
            "You are not allowed to perform this action.".to_string(),
        )),
        CoordinatorError::Conflict => Some(UserNotice::Toast(
            "This order has changed. The latest state has been loaded.".to_string(),
        )),
        CoordinatorError::NotFound => match surface {
            Surface::Order => Some(UserNotice::PageError(
                "This order is no longer available.".to_string(),
            )),
            // Chat action bars simply render nothing.
            Surface::Chat => None,
        },
        CoordinatorError::Transport(_) => Some(UserNotice::Toast(
            "Network error. Please try again.".to_string(),
        )),
    }
}
