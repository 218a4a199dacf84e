//! Contract state projection
//!
//! Both the chat surface and the order-detail surface render from the same
//! projection of a contract record. Projecting once and sharing the result is
//! what keeps the two UIs from ever disagreeing about whose turn it is.

use serde::Serialize;
use uuid::Uuid;

use crate::models::{Contract, ContractStatus};

/// The viewer's relationship to a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    Buyer,
    Seller,
    /// Neither party. No action surface is rendered for observers.
    Observer,
}

/// Display color bucket for a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusColor {
    Amber,
    Green,
    Red,
    Blue,
    Neutral,
}

/// UI-visible state derived from a contract record, for one viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedView {
    pub role: Role,
    pub can_confirm_buyer: bool,
    pub can_confirm_seller: bool,
    pub can_forfeit: bool,
    pub status_label: String,
    pub status_color: StatusColor,
    /// Both confirmation timestamps are set but the status has not caught up
    /// to SUCCESS yet (server propagation lag). Show a waiting indicator;
    /// never offer to re-confirm.
    pub awaiting_settlement: bool,
}

/// Fixed status display table, with an explicit unknown-status fallback that
/// renders the raw string in a neutral style.
pub fn status_display(status: &ContractStatus) -> (String, StatusColor) {
    match status {
        ContractStatus::AwaitingConfirmation => {
            ("Awaiting confirmation".to_string(), StatusColor::Amber)
        }
        ContractStatus::Success => ("Transaction complete".to_string(), StatusColor::Green),
        ContractStatus::ForfeitedExternal => {
            ("Forfeited (external settlement)".to_string(), StatusColor::Red)
        }
        ContractStatus::PendingRefund => ("Refund in progress".to_string(), StatusColor::Blue),
        ContractStatus::Other(raw) => (raw.clone(), StatusColor::Neutral),
    }
}

/// Pure projection of `(contract, current_user_id)` onto the view state.
/// Deterministic: identical inputs always yield an identical view.
pub fn project(contract: &Contract, current_user_id: Uuid) -> ProjectedView {
    let role = if current_user_id == contract.buyer_id {
        Role::Buyer
    } else if current_user_id == contract.seller_id {
        Role::Seller
    } else {
        Role::Observer
    };

    let terminal = contract.status.is_terminal();
    let (status_label, status_color) = status_display(&contract.status);

    let can_confirm_buyer = role == Role::Buyer
        && contract.buyer_confirmed_at.is_none()
        && contract.status == ContractStatus::AwaitingConfirmation;

    let can_confirm_seller =
        role == Role::Seller && contract.seller_confirmed_at.is_none() && !terminal;

    let can_forfeit = role == Role::Seller && !terminal;

    let awaiting_settlement = contract.buyer_confirmed_at.is_some()
        && contract.seller_confirmed_at.is_some()
        && contract.status == ContractStatus::AwaitingConfirmation;

    ProjectedView {
        role,
        can_confirm_buyer,
        can_confirm_seller,
        can_forfeit,
        status_label,
        status_color,
        awaiting_settlement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_contract(status: ContractStatus) -> Contract {
        Contract {
            id: Uuid::new_v4(),
            listing_id: Uuid::new_v4(),
            buyer_id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            status,
            buyer_confirmed_at: None,
            seller_confirmed_at: None,
            confirmed_at: None,
            is_external_transaction: false,
            fee_rate: None,
        }
    }

    #[test]
    fn buyer_can_confirm_while_awaiting() {
        let mut contract = test_contract(ContractStatus::AwaitingConfirmation);
        contract.seller_confirmed_at = Some(Utc::now());

        let view = project(&contract, contract.buyer_id);
        assert_eq!(view.role, Role::Buyer);
        assert!(view.can_confirm_buyer);
        assert!(!view.can_confirm_seller);
        assert!(!view.can_forfeit);
    }

    #[test]
    fn buyer_cannot_reconfirm() {
        let mut contract = test_contract(ContractStatus::AwaitingConfirmation);
        contract.buyer_confirmed_at = Some(Utc::now());

        let view = project(&contract, contract.buyer_id);
        assert!(!view.can_confirm_buyer);
    }

    #[test]
    fn seller_flags_track_terminality() {
        let contract = test_contract(ContractStatus::AwaitingConfirmation);
        let view = project(&contract, contract.seller_id);
        assert_eq!(view.role, Role::Seller);
        assert!(view.can_confirm_seller);
        assert!(view.can_forfeit);

        // Refund path is server-driven but not terminal: the seller's own
        // confirmation is still recordable.
        let contract = test_contract(ContractStatus::PendingRefund);
        let view = project(&contract, contract.seller_id);
        assert!(view.can_confirm_seller);
        assert!(view.can_forfeit);
    }

    #[test]
    fn forfeited_is_fully_inert() {
        let contract = test_contract(ContractStatus::ForfeitedExternal);

        let buyer = project(&contract, contract.buyer_id);
        assert!(!buyer.can_confirm_buyer);

        let seller = project(&contract, contract.seller_id);
        assert!(!seller.can_confirm_seller);
        assert!(!seller.can_forfeit);
    }

    #[test]
    fn observer_gets_no_actions() {
        let mut contract = test_contract(ContractStatus::AwaitingConfirmation);
        contract.seller_confirmed_at = Some(Utc::now());

        let view = project(&contract, Uuid::new_v4());
        assert_eq!(view.role, Role::Observer);
        assert!(!view.can_confirm_buyer);
        assert!(!view.can_confirm_seller);
        assert!(!view.can_forfeit);
    }

    #[test]
    fn projection_is_deterministic() {
        let contract = test_contract(ContractStatus::AwaitingConfirmation);
        let first = project(&contract, contract.buyer_id);
        let second = project(&contract, contract.buyer_id);
        assert_eq!(first, second);
    }

    #[test]
    fn settlement_lag_suppresses_reconfirm_but_is_flagged() {
        let now = Utc::now();
        let mut contract = test_contract(ContractStatus::AwaitingConfirmation);
        contract.buyer_confirmed_at = Some(now);
        contract.seller_confirmed_at = Some(now);

        let view = project(&contract, contract.buyer_id);
        assert!(!view.can_confirm_buyer);
        assert!(view.awaiting_settlement);

        let view = project(&contract, contract.seller_id);
        assert!(!view.can_confirm_seller);
        assert!(view.awaiting_settlement);
    }

    #[test]
    fn unknown_status_renders_raw_string() {
        let contract = test_contract(ContractStatus::Other("UNDER_INSPECTION".into()));
        let view = project(&contract, contract.buyer_id);
        assert_eq!(view.status_label, "UNDER_INSPECTION");
        assert_eq!(view.status_color, StatusColor::Neutral);
    }

    #[test]
    fn success_status_display() {
        let now = Utc::now();
        let mut contract = test_contract(ContractStatus::Success);
        contract.buyer_confirmed_at = Some(now);
        contract.seller_confirmed_at = Some(now);
        contract.confirmed_at = Some(now);

        let view = project(&contract, contract.buyer_id);
        assert_eq!(view.status_color, StatusColor::Green);
        assert!(!view.awaiting_settlement);
        assert!(!view.can_confirm_buyer);
    }
}
