//! Error types for the dialog crate.
//!
//! Errors are split by who is at fault:
//! - `Rejection`: a controller could not interpret the event it received.
//!   Recoverable; the caller degrades gracefully and the session survives.
//! - `StructuralError`: the controller wiring itself is wrong (closing the
//!   root, dispatching into a controller that is already running).
//!   Must surface as a hard failure.
//! - `DialogError`: what every controller entry point returns.

use crate::controller::ControllerId;
use std::fmt;

/// A controller refused an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The event kind is not one the controller handles.
    UnexpectedEvent {
        controller: &'static str,
        event: String,
    },
    /// A button action that is not part of the controller's keyboard.
    UnknownAction {
        controller: &'static str,
        action: String,
    },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEvent { controller, event } => {
                write!(f, "{controller} cannot handle event {event}")
            }
            Self::UnknownAction { controller, action } => {
                write!(f, "{controller} has no button with action '{action}'")
            }
        }
    }
}

impl std::error::Error for Rejection {}

/// The controller tree was driven in a way it does not support.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// `close` was called on a controller without a parent.
    CannotCloseRoot { id: ControllerId },
    /// The controller id does not (or no longer) exist in the tree.
    UnknownController { id: ControllerId },
    /// The controller is already running one of its own methods.
    ControllerBusy { id: ControllerId },
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CannotCloseRoot { id } => write!(f, "can't close root controller {id}"),
            Self::UnknownController { id } => write!(f, "controller {id} is not in the tree"),
            Self::ControllerBusy { id } => {
                write!(f, "controller {id} is re-entered while handling a call")
            }
        }
    }
}

impl std::error::Error for StructuralError {}

/// Error returned by controller entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogError {
    /// Recoverable refusal of an event.
    Rejected(Rejection),
    /// Wiring bug; never swallow.
    Structural(StructuralError),
}

impl DialogError {
    /// Returns true for errors that indicate a wiring bug.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural(_))
    }

    /// Shorthand for an [`Rejection::UnexpectedEvent`].
    #[must_use]
    pub fn unexpected_event(controller: &'static str, event: impl fmt::Debug) -> Self {
        Self::Rejected(Rejection::UnexpectedEvent {
            controller,
            event: format!("{event:?}"),
        })
    }

    /// Shorthand for an [`Rejection::UnknownAction`].
    #[must_use]
    pub fn unknown_action(controller: &'static str, action: impl Into<String>) -> Self {
        Self::Rejected(Rejection::UnknownAction {
            controller,
            action: action.into(),
        })
    }
}

impl fmt::Display for DialogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(e) => write!(f, "event rejected: {e}"),
            Self::Structural(e) => write!(f, "controller wiring error: {e}"),
        }
    }
}

impl std::error::Error for DialogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Rejected(e) => Some(e),
            Self::Structural(e) => Some(e),
        }
    }
}

impl From<Rejection> for DialogError {
    fn from(e: Rejection) -> Self {
        Self::Rejected(e)
    }
}

impl From<StructuralError> for DialogError {
    fn from(e: StructuralError) -> Self {
        Self::Structural(e)
    }
}
