//! Root screen every new user starts on.

use switchboard_dialog::{
    Button, Context, Controller, DialogError, Event, EventKind, Node, OutMessage, ParseMode,
    View, YesNoController,
};

const CONFIRM: &str = "confirm";
const HELLO: &str = "hello";

/// Main menu: greets, and asks for confirmation through a yes/no prompt.
#[derive(Debug, Default)]
pub struct MainMenu {
    confirmed: u32,
}

impl MainMenu {
    /// Creates the root node for a new session.
    #[must_use]
    pub fn node() -> Node {
        let view = View::new("*Main menu*")
            .with_buttons(vec![vec![Button::new("Confirm"), Button::new("Hello")]])
            .with_parse_mode(ParseMode::Markdown);
        Node::new(view, Self::default())
    }

    /// Number of prompts answered with yes.
    #[must_use]
    pub fn confirmed(&self) -> u32 {
        self.confirmed
    }
}

impl Controller for MainMenu {
    fn name(&self) -> &'static str {
        "MainMenu"
    }

    fn process_event(
        &mut self,
        cx: &mut Context<'_>,
        event: &Event,
    ) -> Result<OutMessage, DialogError> {
        match &event.kind {
            EventKind::ButtonAction { name } if name == CONFIRM => {
                cx.show_child(YesNoController::node("Are you sure?"))
            }
            EventKind::ButtonAction { name } if name == HELLO => {
                Ok(OutMessage::new("Hello!").edit_last() + cx.render(self))
            }
            EventKind::ButtonAction { name } => Err(DialogError::unknown_action(self.name(), name)),
            EventKind::Message { text } => {
                Ok(OutMessage::new(format!("You said: {text}")) + cx.render(self))
            }
            EventKind::Command { .. } => Ok(cx.render(self)),
        }
    }

    fn on_child_closed(
        &mut self,
        cx: &mut Context<'_>,
        child: &dyn Controller,
    ) -> Result<OutMessage, DialogError> {
        let answer = child
            .downcast_ref::<YesNoController>()
            .and_then(|prompt| prompt.result);
        let reply = match answer {
            Some(true) => {
                self.confirmed += 1;
                "Confirmed."
            }
            _ => "Cancelled.",
        };
        Ok(OutMessage::new(reply).edit_last() + cx.render(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_core::UserId;
    use switchboard_dialog::ControllerTree;

    fn user() -> UserId {
        UserId::new(1)
    }

    #[test]
    fn confirm_opens_prompt_and_yes_is_counted() {
        let mut tree = ControllerTree::new(MainMenu::node());

        let prompt = tree.process_event(&Event::button(user(), "confirm")).unwrap();
        assert_eq!(prompt.text, "Are you sure?");

        let reply = tree.process_event(&Event::button(user(), "yes")).unwrap();
        let texts: Vec<&str> = reply.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["Confirmed.", "*Main menu*"]);
        assert!(reply.edit_the_last);

        let menu = tree.controller::<MainMenu>(tree.root()).unwrap();
        assert_eq!(menu.confirmed(), 1);
    }

    #[test]
    fn no_is_cancelled() {
        let mut tree = ControllerTree::new(MainMenu::node());
        tree.process_event(&Event::button(user(), "confirm")).unwrap();

        let reply = tree.process_event(&Event::button(user(), "no")).unwrap();

        assert_eq!(reply.text, "Cancelled.");
        assert_eq!(tree.controller::<MainMenu>(tree.root()).unwrap().confirmed(), 0);
    }

    #[test]
    fn start_command_rerenders_menu() {
        let mut tree = ControllerTree::new(MainMenu::node());
        let event = Event::command(user(), "start", vec![]);
        assert_eq!(tree.process_event(&event).unwrap().text, "*Main menu*");
    }

    #[test]
    fn text_is_echoed_before_menu() {
        let mut tree = ControllerTree::new(MainMenu::node());
        let reply = tree.process_event(&Event::message(user(), "hi")).unwrap();
        assert_eq!(reply.text, "You said: hi");
        assert_eq!(reply.len(), 2);
    }

    #[test]
    fn unknown_button_is_rejected() {
        let mut tree = ControllerTree::new(MainMenu::node());
        let err = tree.process_event(&Event::button(user(), "nope")).unwrap_err();
        assert!(!err.is_structural());
    }
}
