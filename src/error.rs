//! Error taxonomy for the coordinator's backend boundary

use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by the contract REST boundary.
///
/// Mutations are never retried automatically on any of these: confirm and
/// forfeit operations mutate monotonic state, so a blind retry could
/// double-apply a terminal transition. The user must re-trigger the action.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The caller's role does not permit the action. The triggering control
    /// should have been hidden by the projector, so hitting this at runtime
    /// points at a projection/UI bug.
    #[error("action not permitted for this account")]
    Forbidden,

    /// The action is no longer valid given current server state (already
    /// confirmed, already terminal, duplicate contract). The cached contract
    /// must be refetched so the UI converges to the true state.
    #[error("action no longer valid for the current contract state")]
    Conflict,

    /// The contract or conversation is not accessible to this caller.
    #[error("contract or conversation not accessible")]
    NotFound,

    /// Network failure or an unexpected HTTP status.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}

impl CoordinatorError {
    /// Map a non-success HTTP status onto the taxonomy. Statuses outside the
    /// contract (403/404/409) fall through to `None`; the caller converts
    /// those into `Transport` via `error_for_status`.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        match status {
            StatusCode::FORBIDDEN => Some(Self::Forbidden),
            StatusCode::NOT_FOUND => Some(Self::NotFound),
            StatusCode::CONFLICT => Some(Self::Conflict),
            _ => None,
        }
    }

    /// True when the local contract snapshot is known stale and must be
    /// refetched before the UI can offer further actions.
    pub fn requires_refetch(&self) -> bool {
        matches!(self, Self::Conflict)
    }
}
