//! The seam between the adapter and the chat network.

use crate::error::TransportError;
use crate::outgoing::TgOutgoingMsg;
use async_trait::async_trait;
use switchboard_core::{CallbackQueryId, MessageId, UserId};
use switchboard_dialog::ParseMode;

/// Outbound primitives of a chat transport.
///
/// Each call is the only suspension point of a turn. Implementations report
/// failures; retrying is up to them.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a new message and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be delivered.
    async fn send_message(&self, msg: &TgOutgoingMsg) -> Result<MessageId, TransportError>;

    /// Replaces the text of an existing message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be edited.
    async fn edit_message_text(
        &self,
        user_id: UserId,
        message_id: MessageId,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), TransportError>;

    /// Acknowledges a callback query so the client stops waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the acknowledgment was not accepted.
    async fn answer_callback_query(&self, id: &CallbackQueryId) -> Result<(), TransportError>;
}
