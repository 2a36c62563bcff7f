//! Outbound message composition.
//!
//! An [`OutMessage`] is both one message and the head of the sequence of
//! messages a single dialog turn produces. Chains are built with `+`, which
//! appends the right-hand chain after the tail of the left-hand one.

use crate::button::Keyboard;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// Markup dialect of a message's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParseMode {
    /// Legacy Markdown.
    Markdown,
    /// MarkdownV2.
    MarkdownV2,
    /// HTML.
    #[serde(rename = "HTML")]
    Html,
}

impl ParseMode {
    /// Returns the tag as the transport expects it.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "Markdown",
            Self::MarkdownV2 => "MarkdownV2",
            Self::Html => "HTML",
        }
    }
}

impl fmt::Display for ParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound message, optionally followed by more.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutMessage {
    /// Message text. Empty text is valid.
    pub text: String,
    /// Inline keyboard attached to the message.
    pub buttons: Keyboard,
    /// Persistent keyboard shown below the input field. `Some(vec![])`
    /// removes a previously shown one.
    pub buttons_below: Option<Keyboard>,
    /// Markup dialect of `text`.
    pub parse_mode: Option<ParseMode>,
    /// Overwrite the most recently rendered message instead of sending.
    pub edit_the_last: bool,
    next: Option<Box<OutMessage>>,
}

impl OutMessage {
    /// Creates a single plain-text message.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Sets the inline keyboard.
    #[must_use]
    pub fn with_buttons(mut self, buttons: Keyboard) -> Self {
        self.buttons = buttons;
        self
    }

    /// Sets the keyboard shown below the input field.
    #[must_use]
    pub fn with_buttons_below(mut self, buttons_below: Keyboard) -> Self {
        self.buttons_below = Some(buttons_below);
        self
    }

    /// Sets the parse mode.
    #[must_use]
    pub fn with_parse_mode(mut self, parse_mode: ParseMode) -> Self {
        self.parse_mode = Some(parse_mode);
        self
    }

    /// Marks this node as an edit of the most recently rendered message.
    #[must_use]
    pub fn edit_last(mut self) -> Self {
        self.edit_the_last = true;
        self
    }

    /// Returns the node following this one.
    #[must_use]
    pub fn next(&self) -> Option<&OutMessage> {
        self.next.as_deref()
    }

    /// Appends `other` (and everything chained after it) at the tail.
    pub fn push(&mut self, other: OutMessage) {
        match self.next {
            Some(ref mut next) => next.push(other),
            None => self.next = Some(Box::new(other)),
        }
    }

    /// Iterates over the nodes of the chain, head first.
    pub fn iter(&self) -> Iter<'_> {
        Iter { node: Some(self) }
    }

    /// Returns the number of nodes in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// A chain always holds at least its head.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns this node without its successors.
    #[must_use]
    pub fn detached(&self) -> OutMessage {
        OutMessage {
            next: None,
            ..self.clone()
        }
    }
}

impl Add for OutMessage {
    type Output = OutMessage;

    fn add(mut self, other: OutMessage) -> OutMessage {
        self.push(other);
        self
    }
}

impl AddAssign for OutMessage {
    fn add_assign(&mut self, other: OutMessage) {
        self.push(other);
    }
}

impl<'a> IntoIterator for &'a OutMessage {
    type Item = &'a OutMessage;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the nodes of an [`OutMessage`] chain.
pub struct Iter<'a> {
    node: Option<&'a OutMessage>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a OutMessage;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.node?;
        self.node = current.next();
        Some(current)
    }
}
