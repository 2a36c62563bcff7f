//! Events delivered to the active controller.

use serde::{Deserialize, Serialize};
use switchboard_core::UserId;

/// One user action. Exactly one event is produced per user turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// The user who acted.
    pub user_id: UserId,
    /// What the user did.
    pub kind: EventKind,
}

/// The kinds of user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// An inline button was pressed; `name` is the button's action.
    ButtonAction { name: String },
    /// Free text.
    Message { text: String },
    /// A slash command such as `/start now`.
    Command { name: String, args: Vec<String> },
}

impl Event {
    /// Creates a button press event.
    #[must_use]
    pub fn button(user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            user_id,
            kind: EventKind::ButtonAction { name: name.into() },
        }
    }

    /// Creates a free text event.
    #[must_use]
    pub fn message(user_id: UserId, text: impl Into<String>) -> Self {
        Self {
            user_id,
            kind: EventKind::Message { text: text.into() },
        }
    }

    /// Creates a command event.
    #[must_use]
    pub fn command(user_id: UserId, name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            user_id,
            kind: EventKind::Command {
                name: name.into(),
                args,
            },
        }
    }

    /// Returns the button action if this is a button press.
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        match &self.kind {
            EventKind::ButtonAction { name } => Some(name),
            _ => None,
        }
    }

    /// Returns the text if this is a free text message.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Message { text } => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_match_kind() {
        let user = UserId::new(7);
        assert_eq!(Event::button(user, "yes").action(), Some("yes"));
        assert_eq!(Event::button(user, "yes").text(), None);
        assert_eq!(Event::message(user, "hi").text(), Some("hi"));
        assert_eq!(Event::command(user, "start", vec![]).action(), None);
    }

    #[test]
    fn event_kind_is_tagged() {
        let event = Event::button(UserId::new(1), "no");
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["kind"]["type"], "button_action");
        assert_eq!(json["kind"]["name"], "no");
    }
}
