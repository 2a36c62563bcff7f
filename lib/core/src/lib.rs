//! Core types and utilities for the switchboard bot engine.
//!
//! This crate provides the identifiers and error handling foundation shared
//! by the dialog engine and the transport adapter.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{CallbackQueryId, MessageId, ParseIdError, TurnId, UserId};
