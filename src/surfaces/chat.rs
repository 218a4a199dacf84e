//! Chat surface bindings
//!
//! The action bars and the inline confirmation card are computed views over
//! the shared contract record and the per-conversation card state. They hold
//! no protocol logic of their own; everything actionable routes through the
//! coordinator.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{
    ConfirmationCardState, Contract, ContractStatus, Conversation, InitiateRequest,
    TransactionKind,
};
use crate::projector::{status_display, Role, StatusColor};

/// Seller-side bar at the bottom of a chat thread.
///
/// Forfeit is deliberately absent here: the only entry point for that
/// terminal action is the order surface dialog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ChatActionBar {
    /// Viewer is not the seller; render nothing.
    Hidden,
    /// No live contract yet: both initiation affordances are offered, the
    /// finalize-order dialog and the direct confirmation request.
    Initiate {
        listing_id: Uuid,
        conversation_id: Uuid,
    },
    /// A live contract awaits the buyer; the seller waits from here.
    AwaitingBuyer,
    /// The contract left the awaiting state. Mirrors the shared status
    /// display so this bar can never contradict the buyer's status line.
    StatusNotice {
        status_label: String,
        status_color: StatusColor,
    },
}

impl ChatActionBar {
    pub fn for_conversation(
        conversation: &Conversation,
        contract: Option<&Contract>,
        current_user_id: Uuid,
    ) -> Self {
        if current_user_id != conversation.seller_id {
            return Self::Hidden;
        }
        match contract {
            Some(contract) if contract.status == ContractStatus::AwaitingConfirmation => {
                Self::AwaitingBuyer
            }
            Some(contract) => {
                let (status_label, status_color) = status_display(&contract.status);
                Self::StatusNotice {
                    status_label,
                    status_color,
                }
            }
            None => Self::Initiate {
                listing_id: conversation.post.id,
                conversation_id: conversation.id,
            },
        }
    }
}

/// The finalize-order dialog: the seller picks the transaction type before
/// the contract is created.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmOrderDialog {
    pub listing_id: Uuid,
    pub conversation_id: Uuid,
    pub selected: TransactionKind,
}

impl ConfirmOrderDialog {
    pub fn open(listing_id: Uuid, conversation_id: Uuid) -> Self {
        Self {
            listing_id,
            conversation_id,
            selected: TransactionKind::OnPlatform,
        }
    }

    pub fn select(&mut self, kind: TransactionKind) {
        self.selected = kind;
    }

    pub fn request(&self) -> InitiateRequest {
        InitiateRequest {
            transaction_kind: Some(self.selected),
        }
    }
}

/// Buyer-side bar: a read-only status line with a deep link to the order
/// page. Never renders a confirm button; buyer confirmation happens on the
/// order page or through the confirmation card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BuyerActionBar {
    Hidden,
    Status { line: String, order_route: String },
}

impl BuyerActionBar {
    pub fn for_conversation(
        conversation: &Conversation,
        contract: Option<&Contract>,
        current_user_id: Uuid,
    ) -> Self {
        if current_user_id != conversation.buyer_id {
            return Self::Hidden;
        }
        let Some(contract) = contract else {
            return Self::Hidden;
        };

        let line = match &contract.status {
            ContractStatus::AwaitingConfirmation => {
                "The seller has finalized this order. Confirm receipt on the order page."
            }
            ContractStatus::Success => "Transaction complete. Thank you!",
            ContractStatus::ForfeitedExternal => {
                "The seller marked this order as settled off-platform."
            }
            ContractStatus::PendingRefund => "A refund is being processed for this order.",
            ContractStatus::Other(_) => "Your order is being processed.",
        };

        Self::Status {
            line: line.to_string(),
            order_route: format!("/orders/{}", contract.id),
        }
    }
}

/// Inline transactional prompt in the chat thread, driven by the
/// per-conversation card state. Exactly one of three states renders,
/// selected by finality first, then by role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ConfirmationCard {
    Hidden,
    /// Both parties confirmed; the signed document link is available.
    Final {
        pdf_url: Option<String>,
        completed_at: Option<DateTime<Utc>>,
    },
    /// The seller requested confirmation and the viewer is the buyer.
    BuyerAgree { contract_id: Uuid },
    /// The seller requested confirmation and waits for the buyer.
    SellerWaiting,
}

impl ConfirmationCard {
    pub fn render(card: Option<&ConfirmationCardState>, role: Role) -> Self {
        let Some(card) = card else {
            return Self::Hidden;
        };
        if card.is_final {
            return Self::Final {
                pdf_url: card.pdf_url.clone(),
                completed_at: card.timestamp,
            };
        }
        match role {
            Role::Buyer => Self::BuyerAgree {
                contract_id: card.contract_id,
            },
            Role::Seller => Self::SellerWaiting,
            Role::Observer => Self::Hidden,
        }
    }
}
