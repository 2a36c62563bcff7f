//! Telegram transport adapter for switchboard.
//!
//! This crate provides:
//!
//! - **Inbound normalization**: raw transport updates become
//!   [`TgIncomingMsg`] records and then dialog [`Event`]s
//! - **Outbound translation**: each node of an [`OutMessage`] chain becomes a
//!   send or an edit, threading message ids through the turn
//! - **Acknowledgment discipline**: every callback query is answered exactly
//!   once, whatever the dialog outcome
//! - **Ordered lanes**: one queue per user so a user's updates are applied
//!   in arrival order while users proceed in parallel
//!
//! [`Event`]: switchboard_dialog::Event
//! [`OutMessage`]: switchboard_dialog::OutMessage

pub mod adapter;
pub mod config;
pub mod error;
pub mod incoming;
pub mod lane;
pub mod mock;
pub mod outgoing;
pub mod transport;

pub use adapter::{Adapter, Delivery, TurnOutcome};
pub use config::{AdapterConfig, EditPolicy};
pub use error::{AdapterError, ProtocolError, TransportError};
pub use incoming::{CallbackQuery, Inbound, RawUpdate, TgIncomingMsg, UpdateKind};
pub use lane::Dispatcher;
pub use mock::{RecordingTransport, TransportCall};
pub use outgoing::{InlineKeyboardButton, ReplyMarkup, TgOutgoingMsg};
pub use transport::Transport;
