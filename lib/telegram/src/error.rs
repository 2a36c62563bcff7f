//! Error types for the adapter crate.
//!
//! - `ProtocolError`: an update is missing fields the adapter needs. The
//!   update is dropped with a warning and never reaches a controller.
//! - `TransportError`: a send, edit or acknowledgment failed. Delivery is
//!   best-effort, so these are logged and the turn continues.
//! - `AdapterError`: failures surfaced to the caller of a turn.

use switchboard_core::UserId;
use switchboard_dialog::StructuralError;
use std::fmt;

/// A malformed or incomplete update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// No chat identity to route the update to.
    MissingChat { update_id: i64 },
    /// A text update without a text body.
    MissingText { update_id: i64 },
    /// A callback query without the button's data.
    MissingCallbackData { update_id: i64 },
    /// A callback query without an id to acknowledge.
    MissingCallbackId { update_id: i64 },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingChat { update_id } => write!(f, "update {update_id} has no chat"),
            Self::MissingText { update_id } => write!(f, "update {update_id} has no text"),
            Self::MissingCallbackData { update_id } => {
                write!(f, "callback update {update_id} has no data")
            }
            Self::MissingCallbackId { update_id } => {
                write!(f, "callback update {update_id} has no query id")
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

/// A failed transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete.
    RequestFailed { method: String, reason: String },
    /// The remote API refused the request.
    Api {
        method: String,
        code: i64,
        description: String,
    },
    /// The response could not be understood.
    MalformedResponse { method: String, reason: String },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { method, reason } => {
                write!(f, "{method} request failed: {reason}")
            }
            Self::Api {
                method,
                code,
                description,
            } => write!(f, "{method} refused ({code}): {description}"),
            Self::MalformedResponse { method, reason } => {
                write!(f, "{method} returned a malformed response: {reason}")
            }
        }
    }
}

impl std::error::Error for TransportError {}

/// Failures of a turn that the caller must see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// The user's controller tree is wired incorrectly.
    Structural { user_id: UserId, error: StructuralError },
    /// An update could not be queued because the user's lane is gone.
    LaneClosed { user_id: UserId },
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural { user_id, error } => {
                write!(f, "controller wiring error for user {user_id}: {error}")
            }
            Self::LaneClosed { user_id } => write!(f, "update lane for user {user_id} is closed"),
        }
    }
}

impl std::error::Error for AdapterError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_display() {
        let err = ProtocolError::MissingChat { update_id: 7 };
        assert!(err.to_string().contains("update 7"));
    }

    #[test]
    fn transport_error_display() {
        let err = TransportError::Api {
            method: "editMessageText".to_string(),
            code: 400,
            description: "message is not modified".to_string(),
        };
        assert!(err.to_string().contains("editMessageText"));
        assert!(err.to_string().contains("400"));
    }
}
