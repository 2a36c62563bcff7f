//! Errors that stop the bot.

use std::fmt;

/// Startup and runtime failures of the bot process.
#[derive(Debug)]
pub enum BotError {
    /// Configuration is missing or invalid.
    Config { details: String },
    /// The HTTP client could not be built.
    HttpClient { details: String },
}

impl fmt::Display for BotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "invalid configuration: {details}"),
            Self::HttpClient { details } => write!(f, "failed to build HTTP client: {details}"),
        }
    }
}

impl std::error::Error for BotError {}
