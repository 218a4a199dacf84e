//! Data models for the order confirmation coordinator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Lifecycle status of a contract.
///
/// The backend may grow statuses this client does not know about; those
/// deserialize into `Other` and render as the raw string rather than failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractStatus {
    AwaitingConfirmation,
    Success,
    ForfeitedExternal,
    PendingRefund,
    /// Any status outside the four known members, kept verbatim for display.
    Other(String),
}

impl ContractStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::AwaitingConfirmation => "AWAITING_CONFIRMATION",
            Self::Success => "SUCCESS",
            Self::ForfeitedExternal => "FORFEITED_EXTERNAL",
            Self::PendingRefund => "PENDING_REFUND",
            Self::Other(raw) => raw,
        }
    }

    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "AWAITING_CONFIRMATION" => Self::AwaitingConfirmation,
            "SUCCESS" => Self::Success,
            "FORFEITED_EXTERNAL" => Self::ForfeitedExternal,
            "PENDING_REFUND" => Self::PendingRefund,
            other => Self::Other(other.to_string()),
        }
    }

    /// Terminal states admit no further confirmation or forfeit action.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::ForfeitedExternal)
    }
}

impl Serialize for ContractStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ContractStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&raw))
    }
}

/// One transaction between a buyer and a seller over one listing.
///
/// `confirmed_at` is derived server-side once both party timestamps are set;
/// the client treats it as read-only. Confirmation timestamps are monotonic:
/// once set they are never cleared by anything on this side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub status: ContractStatus,
    pub buyer_confirmed_at: Option<DateTime<Utc>>,
    pub seller_confirmed_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub is_external_transaction: bool,
    #[serde(default)]
    pub fee_rate: Option<f64>,
}

/// Chat thread bound 1:1 to a (post, buyer, seller) triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub post: PostSummary,
}

/// Denormalized listing summary carried on the conversation banner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    pub price: i64,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// Which side of the transaction an event or action belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionParty {
    Buyer,
    Seller,
}

/// Whether payment custody stays on the platform or the parties settle
/// entirely off-platform. Chosen in the confirm-order dialog at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    OnPlatform,
    OffPlatform,
}

impl TransactionKind {
    pub fn is_external(self) -> bool {
        matches!(self, Self::OffPlatform)
    }
}

/// Ephemeral, client-only state behind the inline confirmation card in chat.
/// Derived from realtime events; scoped per conversation, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationCardState {
    pub contract_id: Uuid,
    pub action_party: ActionParty,
    pub is_final: bool,
    pub pdf_url: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Server-pushed events on the per-conversation realtime channel.
/// Delivery is at-least-once and unordered; the adapter enforces that a
/// final card for a contract is never overwritten by a late non-final event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeEvent {
    #[serde(rename_all = "camelCase")]
    ConfirmationRequested {
        conversation_id: Uuid,
        contract_id: Uuid,
        action_party: ActionParty,
    },
    #[serde(rename_all = "camelCase")]
    ConfirmationComplete {
        conversation_id: Uuid,
        contract_id: Uuid,
        #[serde(default)]
        pdf_url: Option<String>,
        timestamp: DateTime<Utc>,
    },
}

impl RealtimeEvent {
    pub fn conversation_id(&self) -> Uuid {
        match self {
            Self::ConfirmationRequested {
                conversation_id, ..
            }
            | Self::ConfirmationComplete {
                conversation_id, ..
            } => *conversation_id,
        }
    }

    pub fn contract_id(&self) -> Uuid {
        match self {
            Self::ConfirmationRequested { contract_id, .. }
            | Self::ConfirmationComplete { contract_id, .. } => *contract_id,
        }
    }
}

/// Body for the buyer/seller confirm endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfirmRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Body for the initiation endpoint. `transaction_kind` is present when the
/// seller went through the confirm-order dialog and absent on the direct
/// confirmation-request path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_kind: Option<TransactionKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_known_members() {
        for raw in [
            "AWAITING_CONFIRMATION",
            "SUCCESS",
            "FORFEITED_EXTERNAL",
            "PENDING_REFUND",
        ] {
            let status = ContractStatus::from_wire(raw);
            assert!(!matches!(status, ContractStatus::Other(_)));
            assert_eq!(status.as_str(), raw);
        }
    }

    #[test]
    fn unknown_status_is_kept_verbatim() {
        let status = ContractStatus::from_wire("UNDER_INSPECTION");
        assert_eq!(status, ContractStatus::Other("UNDER_INSPECTION".into()));
        assert_eq!(status.as_str(), "UNDER_INSPECTION");
        assert!(!status.is_terminal());
    }

    #[test]
    fn terminal_statuses() {
        assert!(ContractStatus::Success.is_terminal());
        assert!(ContractStatus::ForfeitedExternal.is_terminal());
        assert!(!ContractStatus::AwaitingConfirmation.is_terminal());
        assert!(!ContractStatus::PendingRefund.is_terminal());
    }

    #[test]
    fn contract_deserializes_from_wire_shape() {
        let json = serde_json::json!({
            "id": "8f8d7f2a-62ea-4f9f-9d3e-9d9f2a8e1c11",
            "listingId": "0e2d2c4a-b3a5-4b46-8a11-2f5f6f7a8b9c",
            "buyerId": "1a2b3c4d-5e6f-4a8b-9c0d-1e2f3a4b5c6d",
            "sellerId": "6d5c4b3a-2f1e-4d0c-9b8a-7f6e5d4c3b2a",
            "status": "AWAITING_CONFIRMATION",
            "buyerConfirmedAt": null,
            "sellerConfirmedAt": "2024-05-01T10:00:00Z",
            "confirmedAt": null,
            "isExternalTransaction": false,
            "feeRate": 0.05
        });
        let contract: Contract = serde_json::from_value(json).unwrap();
        assert_eq!(contract.status, ContractStatus::AwaitingConfirmation);
        assert!(contract.buyer_confirmed_at.is_none());
        assert!(contract.seller_confirmed_at.is_some());
        assert_eq!(contract.fee_rate, Some(0.05));
    }

    #[test]
    fn realtime_events_decode() {
        let requested: RealtimeEvent = serde_json::from_str(
            r#"{
                "type": "confirmation_requested",
                "conversationId": "8f8d7f2a-62ea-4f9f-9d3e-9d9f2a8e1c11",
                "contractId": "0e2d2c4a-b3a5-4b46-8a11-2f5f6f7a8b9c",
                "actionParty": "SELLER"
            }"#,
        )
        .unwrap();
        assert!(matches!(
            requested,
            RealtimeEvent::ConfirmationRequested {
                action_party: ActionParty::Seller,
                ..
            }
        ));

        let complete: RealtimeEvent = serde_json::from_str(
            r#"{
                "type": "confirmation_complete",
                "conversationId": "8f8d7f2a-62ea-4f9f-9d3e-9d9f2a8e1c11",
                "contractId": "0e2d2c4a-b3a5-4b46-8a11-2f5f6f7a8b9c",
                "pdfUrl": "https://cdn.example.com/contracts/abc.pdf",
                "timestamp": "2024-05-01T10:00:00Z"
            }"#,
        )
        .unwrap();
        assert!(matches!(
            complete,
            RealtimeEvent::ConfirmationComplete { pdf_url: Some(_), .. }
        ));
    }
}
