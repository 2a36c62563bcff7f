//! switchboard bot runner.
//!
//! Wires the dialog engine and the Telegram adapter to the Bot API: reads
//! configuration from the environment, long-polls for updates and feeds them
//! through per-user lanes.

pub mod bot_api;
pub mod config;
pub mod error;
pub mod menu;
