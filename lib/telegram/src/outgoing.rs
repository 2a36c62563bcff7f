//! Outbound translation.
//!
//! Each node of an [`OutMessage`] chain becomes one [`TgOutgoingMsg`]: a
//! send, or an edit once the adapter has bound `edit_message_with_id`.

use serde::{Deserialize, Serialize};
use switchboard_core::{MessageId, UserId};
use switchboard_dialog::{Keyboard, OutMessage, ParseMode};

/// A button of an inline keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    /// Label.
    pub text: String,
    /// Action delivered back in the callback query.
    pub callback_data: String,
}

/// Keyboard attached to a sent message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyMarkup {
    /// Buttons attached to the message itself.
    Inline(Vec<Vec<InlineKeyboardButton>>),
    /// Persistent keyboard below the input field, resized to fit and hidden
    /// after one use.
    Keyboard(Vec<Vec<String>>),
    /// Removes a previously shown persistent keyboard.
    Remove,
}

/// One outbound transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TgOutgoingMsg {
    /// Recipient chat.
    pub user_id: UserId,
    /// Text to show.
    pub text: String,
    /// Markup dialect of `text`.
    pub parse_mode: Option<ParseMode>,
    /// Inline keyboard rows.
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
    /// Persistent keyboard rows; `Some(vec![])` removes the keyboard.
    pub keyboard_below: Option<Vec<Vec<String>>>,
    /// Message to overwrite; `None` sends a new message.
    pub edit_message_with_id: Option<MessageId>,
}

impl TgOutgoingMsg {
    /// Translates one chain node, ignoring its successors.
    #[must_use]
    pub fn from_node(user_id: UserId, node: &OutMessage) -> Self {
        Self {
            user_id,
            text: node.text.clone(),
            parse_mode: node.parse_mode,
            inline_keyboard: inline_rows(&node.buttons),
            keyboard_below: node.buttons_below.as_ref().map(label_rows),
            edit_message_with_id: None,
        }
    }

    /// Creates a plain text message.
    #[must_use]
    pub fn text(user_id: UserId, text: impl Into<String>) -> Self {
        Self {
            user_id,
            text: text.into(),
            parse_mode: None,
            inline_keyboard: Vec::new(),
            keyboard_below: None,
            edit_message_with_id: None,
        }
    }

    /// Returns true if this call overwrites an existing message.
    #[must_use]
    pub fn is_edit(&self) -> bool {
        self.edit_message_with_id.is_some()
    }

    /// Picks the keyboard to attach to a send.
    ///
    /// A persistent keyboard takes precedence over inline buttons; an empty
    /// one removes whatever keyboard the user currently sees.
    #[must_use]
    pub fn reply_markup(&self) -> Option<ReplyMarkup> {
        match &self.keyboard_below {
            Some(rows) if rows.is_empty() => Some(ReplyMarkup::Remove),
            Some(rows) => Some(ReplyMarkup::Keyboard(rows.clone())),
            None if self.inline_keyboard.is_empty() => None,
            None => Some(ReplyMarkup::Inline(self.inline_keyboard.clone())),
        }
    }
}

fn inline_rows(keyboard: &Keyboard) -> Vec<Vec<InlineKeyboardButton>> {
    keyboard
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| InlineKeyboardButton {
                    text: button.text.clone(),
                    callback_data: button.action.clone(),
                })
                .collect()
        })
        .collect()
}

fn label_rows(keyboard: &Keyboard) -> Vec<Vec<String>> {
    keyboard
        .iter()
        .map(|row| row.iter().map(|button| button.text.clone()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_dialog::Button;

    fn user() -> UserId {
        UserId::new(3)
    }

    #[test]
    fn inline_buttons_carry_actions() {
        let node = OutMessage::new("Confirm?").with_buttons(vec![vec![
            Button::new("Yes"),
            Button::with_action("No", "N"),
        ]]);

        let msg = TgOutgoingMsg::from_node(user(), &node);

        assert!(!msg.is_edit());
        assert_eq!(
            msg.reply_markup(),
            Some(ReplyMarkup::Inline(vec![vec![
                InlineKeyboardButton {
                    text: "Yes".to_string(),
                    callback_data: "yes".to_string(),
                },
                InlineKeyboardButton {
                    text: "No".to_string(),
                    callback_data: "N".to_string(),
                },
            ]]))
        );
    }

    #[test]
    fn keyboard_below_wins_over_inline_buttons() {
        let node = OutMessage::new("menu")
            .with_buttons(vec![vec![Button::new("Inline")]])
            .with_buttons_below(vec![vec![Button::new("Help"), Button::new("Settings")]]);

        let msg = TgOutgoingMsg::from_node(user(), &node);

        assert_eq!(
            msg.reply_markup(),
            Some(ReplyMarkup::Keyboard(vec![vec![
                "Help".to_string(),
                "Settings".to_string()
            ]]))
        );
    }

    #[test]
    fn empty_keyboard_below_removes_keyboard() {
        let node = OutMessage::new("bye").with_buttons_below(vec![]);
        let msg = TgOutgoingMsg::from_node(user(), &node);
        assert_eq!(msg.reply_markup(), Some(ReplyMarkup::Remove));
    }

    #[test]
    fn plain_message_has_no_markup() {
        let msg = TgOutgoingMsg::text(user(), "hi");
        assert_eq!(msg.reply_markup(), None);
        assert_eq!(msg.parse_mode, None);
    }

    #[test]
    fn from_node_ignores_successors_and_keeps_parse_mode() {
        let chain = OutMessage::new("first").with_parse_mode(ParseMode::Html)
            + OutMessage::new("second");
        let msg = TgOutgoingMsg::from_node(user(), &chain);
        assert_eq!(msg.text, "first");
        assert_eq!(msg.parse_mode, Some(ParseMode::Html));
    }
}
