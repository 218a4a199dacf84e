//! Order surface bindings
//!
//! The contract detail page renders the same projection as the chat surface
//! and hosts the two action entry points: the confirmation dialog (confirm
//! with optional note) and, behind a two-stage guard inside that dialog, the
//! seller's only access to the forfeit transition.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{ActionParty, ConfirmRequest, Contract, ContractStatus};
use crate::projector::{ProjectedView, Role, StatusColor};

/// The confirm button plus the buyer's post-success rating prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractActionsCard {
    pub confirm: Option<ConfirmButton>,
    pub show_rating_prompt: bool,
    pub waiting_for_system: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfirmButton {
    pub party: ActionParty,
    pub label: &'static str,
    pub color: StatusColor,
}

impl ContractActionsCard {
    pub fn render(contract: &Contract, view: &ProjectedView, has_rated: bool) -> Self {
        let confirm = if view.can_confirm_buyer {
            Some(ConfirmButton {
                party: ActionParty::Buyer,
                label: "Confirm receipt",
                color: StatusColor::Green,
            })
        } else if view.can_confirm_seller {
            Some(ConfirmButton {
                party: ActionParty::Seller,
                label: "Confirm handover",
                color: StatusColor::Blue,
            })
        } else {
            None
        };

        Self {
            confirm,
            show_rating_prompt: view.role == Role::Buyer
                && contract.status == ContractStatus::Success
                && !has_rated,
            waiting_for_system: view.awaiting_settlement,
        }
    }
}

/// Per-field confirmation display on the status card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ConfirmationField {
    Confirmed(DateTime<Utc>),
    Waiting,
}

impl ConfirmationField {
    fn from_timestamp(timestamp: Option<DateTime<Utc>>) -> Self {
        match timestamp {
            Some(at) => Self::Confirmed(at),
            None => Self::Waiting,
        }
    }
}

/// Non-interactive rendering of the contract's confirmation timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractStatusCard {
    pub buyer: ConfirmationField,
    pub seller: ConfirmationField,
    pub completed: ConfirmationField,
    pub is_external_transaction: bool,
    pub fee_rate: Option<f64>,
}

impl ContractStatusCard {
    pub fn render(contract: &Contract) -> Self {
        Self {
            buyer: ConfirmationField::from_timestamp(contract.buyer_confirmed_at),
            seller: ConfirmationField::from_timestamp(contract.seller_confirmed_at),
            completed: ConfirmationField::from_timestamp(contract.confirmed_at),
            is_external_transaction: contract.is_external_transaction,
            fee_rate: contract.fee_rate,
        }
    }
}

/// Progress of the destructive forfeit action inside the dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ForfeitStage {
    Closed,
    /// The forfeit sub-dialog is open; one more explicit confirm is needed.
    Armed,
}

/// Proof that the two-stage forfeit guard was walked. The coordinator's
/// forfeit operation only accepts this token, so the destructive call cannot
/// be reached from anywhere but an armed dialog.
#[derive(Debug)]
pub struct ForfeitTicket {
    contract_id: Uuid,
}

impl ForfeitTicket {
    pub fn contract_id(&self) -> Uuid {
        self.contract_id
    }
}

/// The confirm mutation entry point, with an optional note field, and the
/// seller's only access to forfeit.
#[derive(Debug)]
pub struct ContractConfirmationDialog {
    contract_id: Uuid,
    party: ActionParty,
    confirm_enabled: bool,
    forfeit_available: bool,
    note: Option<String>,
    forfeit: ForfeitStage,
}

impl ContractConfirmationDialog {
    /// Open the dialog for the current viewer, or `None` when the projection
    /// offers them nothing here.
    pub fn open(contract: &Contract, view: &ProjectedView) -> Option<Self> {
        if view.can_confirm_buyer {
            return Some(Self::new(contract.id, ActionParty::Buyer, true, false));
        }
        if view.can_confirm_seller || view.can_forfeit {
            return Some(Self::new(
                contract.id,
                ActionParty::Seller,
                view.can_confirm_seller,
                view.can_forfeit,
            ));
        }
        None
    }

    fn new(
        contract_id: Uuid,
        party: ActionParty,
        confirm_enabled: bool,
        forfeit_available: bool,
    ) -> Self {
        Self {
            contract_id,
            party,
            confirm_enabled,
            forfeit_available,
            note: None,
            forfeit: ForfeitStage::Closed,
        }
    }

    pub fn party(&self) -> ActionParty {
        self.party
    }

    pub fn can_confirm(&self) -> bool {
        self.confirm_enabled
    }

    pub fn can_forfeit(&self) -> bool {
        self.forfeit_available
    }

    pub fn forfeit_armed(&self) -> bool {
        self.forfeit == ForfeitStage::Armed
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        let note = note.into();
        self.note = (!note.trim().is_empty()).then_some(note);
    }

    /// The confirm payload, when confirmation is offered to this viewer.
    pub fn confirm_request(&self) -> Option<(Uuid, ActionParty, ConfirmRequest)> {
        self.confirm_enabled.then(|| {
            (
                self.contract_id,
                self.party,
                ConfirmRequest {
                    note: self.note.clone(),
                },
            )
        })
    }

    /// Stage one: open the forfeit sub-dialog.
    pub fn arm_forfeit(&mut self) -> bool {
        if self.forfeit_available && self.party == ActionParty::Seller {
            self.forfeit = ForfeitStage::Armed;
            true
        } else {
            false
        }
    }

    pub fn cancel_forfeit(&mut self) {
        self.forfeit = ForfeitStage::Closed;
    }

    /// Stage two: the explicit second confirm. Only an armed dialog yields a
    /// ticket, and arming is consumed so a second ticket needs both stages
    /// again.
    pub fn confirm_forfeit(&mut self) -> Option<ForfeitTicket> {
        if self.forfeit == ForfeitStage::Armed {
            self.forfeit = ForfeitStage::Closed;
            Some(ForfeitTicket {
                contract_id: self.contract_id,
            })
        } else {
            None
        }
    }
}
