//! Yes/no prompt.
//!
//! The template for modal dialogs that collect one answer and close: the
//! parent shows it as a child, and reads `result` in its `on_child_closed`.

use crate::button::Button;
use crate::controller::{Context, Controller, Node, View};
use crate::error::DialogError;
use crate::event::{Event, EventKind};
use crate::message::OutMessage;

/// Action of the "Yes" button.
pub const YES: &str = "yes";
/// Action of the "No" button.
pub const NO: &str = "no";

/// Asks a question with Yes and No buttons and closes on the answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YesNoController {
    /// The answer, once given.
    pub result: Option<bool>,
}

impl YesNoController {
    /// Creates the prompt node for `question`.
    #[must_use]
    pub fn node(question: impl Into<String>) -> Node {
        let view = View::new(question).with_buttons(vec![vec![
            Button::with_action("Yes", YES),
            Button::with_action("No", NO),
        ]]);
        Node::new(view, Self::default())
    }
}

impl Controller for YesNoController {
    fn name(&self) -> &'static str {
        "YesNoController"
    }

    fn process_event(
        &mut self,
        cx: &mut Context<'_>,
        event: &Event,
    ) -> Result<OutMessage, DialogError> {
        match &event.kind {
            EventKind::ButtonAction { name } if name == YES || name == NO => {
                self.result = Some(name == YES);
                cx.close(self)
            }
            EventKind::ButtonAction { name } => Err(DialogError::unknown_action(self.name(), name)),
            other => Err(DialogError::unexpected_event(self.name(), other)),
        }
    }
}
