//! Host document abstraction
//!
//! The controller never touches a concrete page. It sees a [`Document`]
//! that can report its location, answer structural queries and deliver
//! mutation notifications, and [`Element`]s that expose just enough of an
//! editable region to read, write and observe it.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::{
    error::Result,
    types::{ElementId, EventKind, ListenerId, MutationRecord},
};

/// Callback registered on an element for one event kind
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Receiving end of a mutation subscription
pub type MutationReceiver = mpsc::UnboundedReceiver<MutationRecord>;

/// A live document the controller observes
pub trait Document: Send + Sync {
    /// Current navigation location (full URL)
    fn location(&self) -> String;

    /// First element matching a structural query, if any.
    ///
    /// An error means the query itself could not run; absence is `Ok(None)`.
    fn query(&self, selector: &str) -> Result<Option<Arc<dyn Element>>>;

    /// Subscribe to subtree mutations of the whole document.
    ///
    /// Navigation in a history-API single-page app is reported only
    /// through mutations; there is no separate reload signal.
    fn observe_mutations(&self) -> MutationReceiver;
}

/// An element inside a [`Document`]
pub trait Element: Send + Sync {
    /// Stable identity for the element's lifetime
    fn id(&self) -> ElementId;

    /// Whether the element is still attached to its document
    fn is_connected(&self) -> bool;

    /// Visible text, markup removed
    fn text_content(&self) -> String;

    /// Rich-text markup of the element's children
    fn inner_html(&self) -> String;

    /// Replace the element's children with the given markup
    fn set_inner_html(&self, markup: &str);

    /// Collapse the selection to the end of the element's content
    fn place_caret_at_end(&self);

    /// Synthesize an event and run every listener registered for it
    fn dispatch(&self, kind: EventKind);

    /// Register a listener; returns the id needed to remove it
    fn add_listener(&self, kind: EventKind, listener: Listener) -> ListenerId;

    /// Remove a listener. Returns `false` if it was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;
}
