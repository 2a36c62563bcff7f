//! Buttons and keyboards.

use serde::{Deserialize, Serialize};

/// Rows of buttons, top to bottom, each row left to right.
pub type Keyboard = Vec<Vec<Button>>;

/// A button shown to the user.
///
/// The `action` is what comes back when the button is pressed. It defaults
/// to the lower-cased text and is compared case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    /// Label shown to the user.
    pub text: String,
    /// Action string delivered on press.
    pub action: String,
}

impl Button {
    /// Creates a button whose action is the lower-cased text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let action = text.to_lowercase();
        Self { text, action }
    }

    /// Creates a button with an explicit action.
    ///
    /// An empty action falls back to the lower-cased text.
    #[must_use]
    pub fn with_action(text: impl Into<String>, action: impl Into<String>) -> Self {
        let action = action.into();
        if action.is_empty() {
            return Self::new(text);
        }
        Self {
            text: text.into(),
            action,
        }
    }
}

/// Finds the first button in `keyboard` with the given action.
///
/// Two buttons sharing an action is a configuration error; the first one
/// in row order wins.
#[must_use]
pub fn find_by_action<'k>(keyboard: &'k Keyboard, action: &str) -> Option<&'k Button> {
    keyboard.iter().flatten().find(|button| button.action == action)
}
