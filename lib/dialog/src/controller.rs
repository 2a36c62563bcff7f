//! The controller tree.
//!
//! Each user owns one [`ControllerTree`]. Controllers live in an arena keyed
//! by [`ControllerId`]; a node owns at most one active child and refers to its
//! parent by id only. The deepest node reached by following child links is the
//! active leaf: it renders the screen and receives every event.
//!
//! A controller's own method runs while the controller is temporarily taken
//! out of the arena. The [`Context`] it receives gives access to the rest of
//! the tree, so it can render, show a child or close itself.

use crate::button::{Button, Keyboard, find_by_action};
use crate::error::{DialogError, StructuralError};
use crate::event::Event;
use crate::message::{OutMessage, ParseMode};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// Identifier of a controller within one tree.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ControllerId(u64);

impl ControllerId {
    /// The id every tree assigns to its root.
    pub const ROOT: Self = Self(0);
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctl#{}", self.0)
    }
}

impl fmt::Debug for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// What a controller shows when it is the active leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    /// Screen text.
    pub text: String,
    /// Inline keyboard; its actions are what the controller reacts to.
    pub buttons: Keyboard,
    /// Persistent keyboard below the input field.
    pub buttons_below: Option<Keyboard>,
    /// Markup dialect of `text`.
    pub parse_mode: Option<ParseMode>,
}

static EMPTY_VIEW: View = View {
    text: String::new(),
    buttons: Vec::new(),
    buttons_below: None,
    parse_mode: None,
};

impl View {
    /// Creates a view with text only.
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

    /// Sets the keyboard below the input field.
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

    /// Renders the view as a single-node message.
    #[must_use]
    pub fn to_message(&self) -> OutMessage {
        let mut message = OutMessage::new(self.text.clone());
        message.buttons = self.buttons.clone();
        message.buttons_below = self.buttons_below.clone();
        message.parse_mode = self.parse_mode;
        message
    }
}

/// Object-safe access to a controller as `dyn Controller` and `dyn Any`.
///
/// Implemented for every controller; lets default trait methods pass
/// `self` to a [`Context`].
pub trait AsController {
    /// Returns `self` as a controller trait object.
    fn as_controller(&self) -> &dyn Controller;

    /// Returns `self` as `Any`, for reading a closed child's state.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Controller> AsController for T {
    fn as_controller(&self) -> &dyn Controller {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Behaviour of one dialog screen.
///
/// Every method has a default: render the view, re-render on any event and
/// re-render when a child closes. Variants override what they need.
pub trait Controller: AsController + Send + 'static {
    /// Name used in logs and rejections.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Renders this controller's screen. Only consulted while the
    /// controller is the active leaf; otherwise the tree delegates to the
    /// child.
    fn render(&self, view: &View) -> OutMessage {
        view.to_message()
    }

    /// Handles an event delivered to this controller as the active leaf.
    fn process_event(
        &mut self,
        cx: &mut Context<'_>,
        event: &Event,
    ) -> Result<OutMessage, DialogError> {
        let _ = event;
        Ok(cx.render(self.as_controller()))
    }

    /// Called on the parent after `child` closed and was detached.
    fn on_child_closed(
        &mut self,
        cx: &mut Context<'_>,
        child: &dyn Controller,
    ) -> Result<OutMessage, DialogError> {
        let _ = child;
        Ok(cx.render(self.as_controller()))
    }
}

impl dyn Controller {
    /// Returns the concrete controller if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Controller>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for dyn Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The plain controller: shows its view and re-renders on any event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Menu;

impl Controller for Menu {
    fn name(&self) -> &'static str {
        "Menu"
    }
}

/// A controller together with the view it starts with.
pub struct Node {
    /// Initial view.
    pub view: View,
    /// Behaviour.
    pub controller: Box<dyn Controller>,
}

impl Node {
    /// Creates a node from a view and a controller.
    #[must_use]
    pub fn new(view: View, controller: impl Controller) -> Self {
        Self {
            view,
            controller: Box::new(controller),
        }
    }

    /// Creates a plain [`Menu`] node.
    #[must_use]
    pub fn menu(view: View) -> Self {
        Self::new(view, Menu)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("view", &self.view)
            .field("controller", &self.controller.name())
            .finish()
    }
}

struct Slot {
    view: View,
    /// `None` while one of the controller's own methods is running.
    controller: Option<Box<dyn Controller>>,
    parent: Option<ControllerId>,
    child: Option<ControllerId>,
}

/// One user's dialog tree.
pub struct ControllerTree {
    slots: HashMap<ControllerId, Slot>,
    next_id: u64,
}

impl ControllerTree {
    /// Creates a tree with the given root.
    #[must_use]
    pub fn new(root: Node) -> Self {
        let mut tree = Self {
            slots: HashMap::new(),
            next_id: 0,
        };
        tree.insert(root, None);
        tree
    }

    /// Returns the root id.
    #[must_use]
    pub fn root(&self) -> ControllerId {
        ControllerId::ROOT
    }

    /// Returns the number of live controllers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// A tree always holds its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns true if `id` is a live controller.
    #[must_use]
    pub fn contains(&self, id: ControllerId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Returns the parent of `id`.
    #[must_use]
    pub fn parent(&self, id: ControllerId) -> Option<ControllerId> {
        self.slots.get(&id).and_then(|slot| slot.parent)
    }

    /// Returns the active child of `id`.
    #[must_use]
    pub fn child(&self, id: ControllerId) -> Option<ControllerId> {
        self.slots.get(&id).and_then(|slot| slot.child)
    }

    /// Returns the view of `id`.
    #[must_use]
    pub fn view(&self, id: ControllerId) -> Option<&View> {
        self.slots.get(&id).map(|slot| &slot.view)
    }

    /// Returns the view of `id` for modification.
    pub fn view_mut(&mut self, id: ControllerId) -> Option<&mut View> {
        self.slots.get_mut(&id).map(|slot| &mut slot.view)
    }

    /// Returns the controller at `id` if it is a `T`.
    #[must_use]
    pub fn controller<T: Controller>(&self, id: ControllerId) -> Option<&T> {
        self.slots
            .get(&id)?
            .controller
            .as_deref()?
            .downcast_ref::<T>()
    }

    /// Returns the active leaf of the whole tree.
    #[must_use]
    pub fn get_current_active(&self) -> ControllerId {
        self.active_from(ControllerId::ROOT)
    }

    /// Follows child links from `id` until a controller without a child.
    #[must_use]
    pub fn active_from(&self, id: ControllerId) -> ControllerId {
        let mut current = id;
        while let Some(child) = self.child(current) {
            current = child;
        }
        current
    }

    /// Renders the whole tree, i.e. its active leaf.
    #[must_use]
    pub fn render(&self) -> OutMessage {
        self.render_node(ControllerId::ROOT)
    }

    /// Renders the subtree at `id`.
    ///
    /// # Errors
    ///
    /// Returns a structural error if `id` is not in the tree.
    pub fn render_from(&self, id: ControllerId) -> Result<OutMessage, DialogError> {
        self.slot(id)?;
        Ok(self.render_node(id))
    }

    /// Finds a button in the keyboard of `id` itself (not its active leaf).
    #[must_use]
    pub fn get_button_by_action(&self, id: ControllerId, action: &str) -> Option<&Button> {
        find_by_action(&self.slots.get(&id)?.view.buttons, action)
    }

    /// Makes `child` the active child of `parent` and renders it.
    ///
    /// An existing child of `parent` is silently replaced and dropped along
    /// with its own descendants.
    ///
    /// # Errors
    ///
    /// Returns a structural error if `parent` is not in the tree.
    pub fn show_child(
        &mut self,
        parent: ControllerId,
        child: Node,
    ) -> Result<OutMessage, DialogError> {
        if let Some(previous) = self.slot(parent)?.child {
            debug!(%parent, %previous, "replacing active child");
            self.remove_subtree(previous);
        }
        let id = self.insert(child, Some(parent));
        self.slot_mut(parent)?.child = Some(id);
        Ok(self.render_node(id))
    }

    /// Closes `id`, returning control to its parent.
    ///
    /// # Errors
    ///
    /// Fails with [`StructuralError::CannotCloseRoot`] for the root, and
    /// passes on whatever the parent's `on_child_closed` returns.
    pub fn close(&mut self, id: ControllerId) -> Result<OutMessage, DialogError> {
        let controller = self.take(id)?;
        let parent = match self.detach(id) {
            Ok(parent) => parent,
            Err(e) => {
                self.restore(id, controller);
                return Err(e.into());
            }
        };
        self.notify_child_closed(parent, &*controller)
    }

    /// Delivers `event` to the active leaf.
    ///
    /// # Errors
    ///
    /// Returns whatever the active controller rejects, or a structural
    /// error if the wiring is broken.
    pub fn process_event(&mut self, event: &Event) -> Result<OutMessage, DialogError> {
        let active = self.get_current_active();
        let mut controller = self.take(active)?;
        debug!(controller = controller.name(), %active, "dispatching event");
        let result = {
            let mut cx = Context { tree: self, id: active };
            controller.process_event(&mut cx, event)
        };
        self.restore(active, controller);
        result
    }

    fn insert(&mut self, node: Node, parent: Option<ControllerId>) -> ControllerId {
        let id = ControllerId(self.next_id);
        self.next_id += 1;
        self.slots.insert(
            id,
            Slot {
                view: node.view,
                controller: Some(node.controller),
                parent,
                child: None,
            },
        );
        id
    }

    fn slot(&self, id: ControllerId) -> Result<&Slot, StructuralError> {
        self.slots
            .get(&id)
            .ok_or(StructuralError::UnknownController { id })
    }

    fn slot_mut(&mut self, id: ControllerId) -> Result<&mut Slot, StructuralError> {
        self.slots
            .get_mut(&id)
            .ok_or(StructuralError::UnknownController { id })
    }

    fn render_node(&self, id: ControllerId) -> OutMessage {
        let leaf = self.active_from(id);
        let Some(slot) = self.slots.get(&leaf) else {
            return OutMessage::default();
        };
        match slot.controller.as_deref() {
            Some(controller) => controller.render(&slot.view),
            None => {
                warn!(controller = %leaf, "rendering a running controller from its view");
                slot.view.to_message()
            }
        }
    }

    fn take(&mut self, id: ControllerId) -> Result<Box<dyn Controller>, StructuralError> {
        self.slot_mut(id)?
            .controller
            .take()
            .ok_or(StructuralError::ControllerBusy { id })
    }

    fn restore(&mut self, id: ControllerId, controller: Box<dyn Controller>) {
        // A controller that closed itself has no slot to return to.
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.controller = Some(controller);
        }
    }

    /// Unlinks `id` from its parent and drops its slot and descendants.
    fn detach(&mut self, id: ControllerId) -> Result<ControllerId, StructuralError> {
        let parent = self
            .slot(id)?
            .parent
            .ok_or(StructuralError::CannotCloseRoot { id })?;
        let parent_slot = self.slot_mut(parent)?;
        if parent_slot.child == Some(id) {
            parent_slot.child = None;
        }
        self.remove_subtree(id);
        Ok(parent)
    }

    fn remove_subtree(&mut self, id: ControllerId) {
        let mut next = Some(id);
        while let Some(current) = next {
            next = self.slots.remove(&current).and_then(|slot| slot.child);
        }
    }

    fn notify_child_closed(
        &mut self,
        parent: ControllerId,
        child: &dyn Controller,
    ) -> Result<OutMessage, DialogError> {
        let mut controller = self.take(parent)?;
        debug!(parent = %parent, child = child.name(), "child closed");
        let result = {
            let mut cx = Context { tree: self, id: parent };
            controller.on_child_closed(&mut cx, child)
        };
        self.restore(parent, controller);
        result
    }
}

impl fmt::Debug for ControllerTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut path = Vec::new();
        let mut current = Some(ControllerId::ROOT);
        while let Some(id) = current {
            path.push(id);
            current = self.child(id);
        }
        f.debug_struct("ControllerTree")
            .field("active_path", &path)
            .field("len", &self.slots.len())
            .finish()
    }
}

/// Access to the tree for a controller whose method is running.
///
/// The running controller is out of the arena for the duration of the
/// call, so operations that need it take it as `this`.
pub struct Context<'t> {
    tree: &'t mut ControllerTree,
    id: ControllerId,
}

impl Context<'_> {
    /// Returns the running controller's id.
    #[must_use]
    pub fn id(&self) -> ControllerId {
        self.id
    }

    /// Returns the running controller's parent.
    #[must_use]
    pub fn parent(&self) -> Option<ControllerId> {
        self.tree.parent(self.id)
    }

    /// Returns the running controller's active child.
    #[must_use]
    pub fn child(&self) -> Option<ControllerId> {
        self.tree.child(self.id)
    }

    /// Returns the running controller's view.
    ///
    /// After the controller closed itself this is an empty view.
    #[must_use]
    pub fn view(&self) -> &View {
        self.tree.view(self.id).unwrap_or(&EMPTY_VIEW)
    }

    /// Returns the running controller's view for modification.
    pub fn view_mut(&mut self) -> Option<&mut View> {
        self.tree.view_mut(self.id)
    }

    /// Looks up a button of the running controller by action.
    #[must_use]
    pub fn button_by_action(&self, action: &str) -> Option<&Button> {
        find_by_action(&self.view().buttons, action)
    }

    /// Renders the running controller: its active child if it has one,
    /// otherwise `this` with its own view.
    #[must_use]
    pub fn render(&self, this: &dyn Controller) -> OutMessage {
        match self.child() {
            Some(child) => self.tree.render_node(child),
            None => this.render(self.view()),
        }
    }

    /// Shows `child` below the running controller and renders it.
    ///
    /// # Errors
    ///
    /// Returns a structural error if the running controller already closed.
    pub fn show_child(&mut self, child: Node) -> Result<OutMessage, DialogError> {
        self.tree.show_child(self.id, child)
    }

    /// Closes the running controller `this` and returns what its parent
    /// renders in response.
    ///
    /// # Errors
    ///
    /// Fails with [`StructuralError::CannotCloseRoot`] when the running
    /// controller is the root.
    pub fn close(&mut self, this: &dyn Controller) -> Result<OutMessage, DialogError> {
        let parent = self.tree.detach(self.id)?;
        self.tree.notify_child_closed(parent, this)
    }
}
