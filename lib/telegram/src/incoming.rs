//! Inbound normalization.
//!
//! A [`RawUpdate`] is what the transport hands over. [`RawUpdate::normalize`]
//! checks it carries what a turn needs and produces an [`Inbound`] record,
//! whose [`TgIncomingMsg`] is then converted into a dialog [`Event`].

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use switchboard_core::{CallbackQueryId, MessageId, UserId};
use switchboard_dialog::Event;

/// Which transport primitive produced an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    /// The user sent a text message.
    Text,
    /// The user pressed an inline button.
    Callback,
}

/// An update as delivered by the transport, before validation.
///
/// For a text update `message_id` and `text` describe the user's message.
/// For a callback update they describe the message the pressed button is
/// attached to, which is also the message an edit in that turn overwrites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUpdate {
    /// Transport sequence number; increases with every update.
    pub update_id: i64,
    /// Which primitive produced the update.
    pub kind: UpdateKind,
    /// Chat the update belongs to.
    pub chat_id: Option<i64>,
    /// Username of the sender.
    pub user_name: Option<String>,
    /// Id of the message described above.
    pub message_id: Option<i64>,
    /// Text of the message described above.
    pub text: Option<String>,
    /// Callback query id, for acknowledgment.
    pub callback_id: Option<String>,
    /// Action string of the pressed button.
    pub callback_data: Option<String>,
}

impl RawUpdate {
    /// Creates a text update.
    #[must_use]
    pub fn text(update_id: i64, chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            update_id,
            kind: UpdateKind::Text,
            chat_id: Some(chat_id),
            user_name: None,
            message_id: None,
            text: Some(text.into()),
            callback_id: None,
            callback_data: None,
        }
    }

    /// Creates a callback query update.
    #[must_use]
    pub fn callback(
        update_id: i64,
        chat_id: i64,
        callback_id: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            update_id,
            kind: UpdateKind::Callback,
            chat_id: Some(chat_id),
            user_name: None,
            message_id: None,
            text: None,
            callback_id: Some(callback_id.into()),
            callback_data: Some(data.into()),
        }
    }

    /// Sets the sender's username.
    #[must_use]
    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    /// Sets the id and text of the message the update refers to.
    #[must_use]
    pub fn with_message(mut self, message_id: i64, text: Option<&str>) -> Self {
        self.message_id = Some(message_id);
        if self.kind == UpdateKind::Callback || text.is_some() {
            self.text = text.map(str::to_string);
        }
        self
    }

    /// Returns the callback query id to acknowledge, if this is a callback.
    #[must_use]
    pub fn callback_query_id(&self) -> Option<CallbackQueryId> {
        match self.kind {
            UpdateKind::Callback => self.callback_id.as_deref().map(CallbackQueryId::new),
            UpdateKind::Text => None,
        }
    }

    /// Returns the user the update belongs to, if known.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.chat_id.map(UserId::new)
    }

    /// Validates the update and builds the normalized record.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] naming the first missing field.
    pub fn normalize(self) -> Result<Inbound, ProtocolError> {
        let update_id = self.update_id;
        let chat_id = self
            .chat_id
            .ok_or(ProtocolError::MissingChat { update_id })?;

        let (text, keyboard_callback, callback) = match self.kind {
            UpdateKind::Text => {
                let text = self.text.ok_or(ProtocolError::MissingText { update_id })?;
                (text, None, None)
            }
            UpdateKind::Callback => {
                let id = self
                    .callback_id
                    .ok_or(ProtocolError::MissingCallbackId { update_id })?;
                let data = self
                    .callback_data
                    .ok_or(ProtocolError::MissingCallbackData { update_id })?;
                let callback = CallbackQuery {
                    id: CallbackQueryId::new(id),
                    message_text: self.text,
                };
                (String::new(), Some(data), Some(callback))
            }
        };

        Ok(Inbound {
            update_id,
            msg: TgIncomingMsg {
                message_id: self.message_id.map(MessageId::new),
                user_id: UserId::new(chat_id),
                user_name: self.user_name,
                text,
                keyboard_callback,
            },
            callback,
        })
    }
}

/// Normalized inbound message.
///
/// A callback update always has empty `text` and a populated
/// `keyboard_callback`; a text update the reverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TgIncomingMsg {
    /// The message that triggered this turn, if the transport named it.
    pub message_id: Option<MessageId>,
    /// The sender's chat.
    pub user_id: UserId,
    /// The sender's username.
    pub user_name: Option<String>,
    /// Text body; empty for callbacks.
    pub text: String,
    /// Action of the pressed button.
    pub keyboard_callback: Option<String>,
}

impl TgIncomingMsg {
    /// Converts the message into a dialog event.
    ///
    /// With `parse_commands`, text starting with `/` becomes a command.
    #[must_use]
    pub fn to_event(&self, parse_commands: bool) -> Event {
        if let Some(action) = &self.keyboard_callback {
            return Event::button(self.user_id, action.clone());
        }
        if parse_commands && let Some((name, args)) = parse_command(&self.text) {
            return Event::command(self.user_id, name, args);
        }
        Event::message(self.user_id, self.text.clone())
    }
}

/// The callback-specific part of an inbound update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackQuery {
    /// Id to acknowledge.
    pub id: CallbackQueryId,
    /// Text currently shown in the message the button belongs to.
    pub message_text: Option<String>,
}

/// A validated update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    /// Transport sequence number.
    pub update_id: i64,
    /// The normalized message.
    pub msg: TgIncomingMsg,
    /// Present for callback updates.
    pub callback: Option<CallbackQuery>,
}

impl Inbound {
    /// Returns true for callback updates.
    #[must_use]
    pub fn is_callback(&self) -> bool {
        self.callback.is_some()
    }
}

/// Splits `/name@bot arg1 arg2` into `("name", ["arg1", "arg2"])`.
fn parse_command(text: &str) -> Option<(String, Vec<String>)> {
    let rest = text.strip_prefix('/')?;
    if rest.starts_with(char::is_whitespace) {
        return None;
    }
    let mut parts = rest.split_whitespace();
    let head = parts.next()?;
    let name = head.split('@').next().unwrap_or(head);
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), parts.map(str::to_string).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_dialog::EventKind;

    #[test]
    fn text_update_normalizes() {
        let inbound = RawUpdate::text(1, 42, "hello")
            .with_user_name("alice")
            .with_message(9, None)
            .normalize()
            .unwrap();

        assert_eq!(inbound.update_id, 1);
        assert!(!inbound.is_callback());
        assert_eq!(inbound.msg.user_id, UserId::new(42));
        assert_eq!(inbound.msg.user_name.as_deref(), Some("alice"));
        assert_eq!(inbound.msg.message_id, Some(MessageId::new(9)));
        assert_eq!(inbound.msg.text, "hello");
        assert_eq!(inbound.msg.keyboard_callback, None);
    }

    #[test]
    fn callback_update_has_empty_text_and_callback() {
        let inbound = RawUpdate::callback(2, 42, "cb-1", "yes")
            .with_message(77, Some("Confirm?"))
            .normalize()
            .unwrap();

        assert_eq!(inbound.msg.text, "");
        assert_eq!(inbound.msg.keyboard_callback.as_deref(), Some("yes"));
        assert_eq!(inbound.msg.message_id, Some(MessageId::new(77)));
        let callback = inbound.callback.unwrap();
        assert_eq!(callback.id, CallbackQueryId::new("cb-1"));
        assert_eq!(callback.message_text.as_deref(), Some("Confirm?"));
    }

    #[test]
    fn missing_chat_is_protocol_error() {
        let mut update = RawUpdate::text(3, 42, "hello");
        update.chat_id = None;
        assert_eq!(
            update.normalize().unwrap_err(),
            ProtocolError::MissingChat { update_id: 3 }
        );
    }

    #[test]
    fn missing_text_is_protocol_error() {
        let mut update = RawUpdate::text(4, 42, "hello");
        update.text = None;
        assert_eq!(
            update.normalize().unwrap_err(),
            ProtocolError::MissingText { update_id: 4 }
        );
    }

    #[test]
    fn missing_callback_data_is_protocol_error() {
        let mut update = RawUpdate::callback(5, 42, "cb", "yes");
        update.callback_data = None;
        assert_eq!(
            update.clone().normalize().unwrap_err(),
            ProtocolError::MissingCallbackData { update_id: 5 }
        );
        // The query can still be acknowledged.
        assert_eq!(update.callback_query_id(), Some(CallbackQueryId::new("cb")));
    }

    #[test]
    fn text_updates_have_nothing_to_acknowledge() {
        assert_eq!(RawUpdate::text(1, 1, "x").callback_query_id(), None);
    }

    #[test]
    fn callback_becomes_button_action() {
        let inbound = RawUpdate::callback(1, 42, "cb", "no").normalize().unwrap();
        assert_eq!(inbound.msg.to_event(true), Event::button(UserId::new(42), "no"));
    }

    #[test]
    fn text_becomes_message() {
        let inbound = RawUpdate::text(1, 42, "hi there").normalize().unwrap();
        assert_eq!(
            inbound.msg.to_event(true),
            Event::message(UserId::new(42), "hi there")
        );
    }

    #[test]
    fn slash_text_becomes_command() {
        let inbound = RawUpdate::text(1, 42, "/start@switchboard_bot now please")
            .normalize()
            .unwrap();

        let event = inbound.msg.to_event(true);
        assert_eq!(
            event.kind,
            EventKind::Command {
                name: "start".to_string(),
                args: vec!["now".to_string(), "please".to_string()],
            }
        );

        let plain = inbound.msg.to_event(false);
        assert_eq!(plain.text(), Some("/start@switchboard_bot now please"));
    }

    #[test]
    fn bare_slash_is_plain_text() {
        assert_eq!(parse_command("/"), None);
        assert_eq!(parse_command("/ start"), None);
        assert_eq!(parse_command("no slash"), None);
    }

    #[test]
    fn raw_update_deserializes() {
        let json = r#"{
            "update_id": 10,
            "kind": "callback",
            "chat_id": 5,
            "user_name": null,
            "message_id": 3,
            "text": "Pick one",
            "callback_id": "q1",
            "callback_data": "a"
        }"#;
        let update: RawUpdate = serde_json::from_str(json).expect("deserialize");
        assert_eq!(update.kind, UpdateKind::Callback);
        assert_eq!(update.user_id(), Some(UserId::new(5)));
    }
}
