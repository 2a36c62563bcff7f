//! Dialog engine for switchboard.
//!
//! This crate provides:
//!
//! - **Events**: typed user actions (button press, free text, slash command)
//! - **Out messages**: chainable outbound message descriptors with
//!   edit-the-last semantics
//! - **Controller tree**: per-user stack of dialog screens where the deepest
//!   controller renders and receives events
//! - **Sessions**: process-wide registry mapping users to their controller tree

pub mod button;
pub mod controller;
pub mod error;
pub mod event;
pub mod message;
pub mod session;
pub mod yes_no;

pub use button::{Button, Keyboard};
pub use controller::{AsController, Context, Controller, ControllerId, ControllerTree, Menu, Node, View};
pub use error::{DialogError, Rejection, StructuralError};
pub use event::{Event, EventKind};
pub use message::{OutMessage, ParseMode};
pub use session::{RootFactory, Session, SessionRegistry};
pub use yes_no::YesNoController;
