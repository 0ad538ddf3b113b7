//! In-memory document
//!
//! A small model of a live page: elements are attached under the selectors
//! they should answer to, user actions (typing, clicking, the host clearing
//! the composer) are driven explicitly, and every structural change is
//! broadcast to mutation observers. Used to run the controller headlessly
//! and in tests.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use tokio::sync::mpsc;

use crate::{
    dom::{Document, Element, Listener, MutationReceiver},
    error::{Error, Result},
    markup,
    types::{ElementId, EventKind, ListenerId, MutationRecord},
};

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// An element of a [`VirtualDocument`]
pub struct VirtualElement {
    id: ElementId,
    connected: AtomicBool,
    html: Mutex<String>,
    caret_at_end: AtomicBool,
    listeners: Mutex<Vec<(ListenerId, EventKind, Listener)>>,
    synthetic: Mutex<HashMap<EventKind, usize>>,
}

impl VirtualElement {
    fn new(markup: &str) -> Self {
        Self {
            id: ElementId(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed)),
            connected: AtomicBool::new(true),
            html: Mutex::new(markup.to_string()),
            caret_at_end: AtomicBool::new(false),
            listeners: Mutex::new(Vec::new()),
            synthetic: Mutex::new(HashMap::new()),
        }
    }

    /// User typing: replace content and fire input listeners
    pub fn type_html(&self, markup: &str) {
        *self.html.lock() = markup.to_string();
        self.caret_at_end.store(true, Ordering::Release);
        self.fire(EventKind::Input);
    }

    /// User activating the element
    pub fn click(&self) {
        self.fire(EventKind::Click);
    }

    /// Host page emptying the element programmatically (no input event)
    pub fn clear(&self) {
        self.html.lock().clear();
        self.caret_at_end.store(false, Ordering::Release);
    }

    /// Live listeners for one event kind
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .lock()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }

    /// How many synthetic events of a kind were dispatched on this element
    pub fn dispatch_count(&self, kind: EventKind) -> usize {
        self.synthetic.lock().get(&kind).copied().unwrap_or(0)
    }

    /// Whether the caret was last placed at the end of the content
    pub fn caret_at_end(&self) -> bool {
        self.caret_at_end.load(Ordering::Acquire)
    }

    fn fire(&self, kind: EventKind) {
        // Clone out first: listeners may call back into this element.
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener();
        }
    }
}

impl Element for VirtualElement {
    fn id(&self) -> ElementId {
        self.id
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn text_content(&self) -> String {
        markup::to_plain_text(&self.html.lock())
    }

    fn inner_html(&self) -> String {
        self.html.lock().clone()
    }

    fn set_inner_html(&self, markup: &str) {
        *self.html.lock() = markup.to_string();
        self.caret_at_end.store(false, Ordering::Release);
    }

    fn place_caret_at_end(&self) {
        self.caret_at_end.store(true, Ordering::Release);
    }

    fn dispatch(&self, kind: EventKind) {
        *self.synthetic.lock().entry(kind).or_insert(0) += 1;
        self.fire(kind);
    }

    fn add_listener(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, kind, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(lid, _, _)| *lid != id);
        listeners.len() != before
    }
}

struct Attached {
    selectors: Vec<String>,
    element: Arc<VirtualElement>,
}

/// A document whose content and location are driven by the caller
pub struct VirtualDocument {
    location: Mutex<String>,
    elements: Mutex<Vec<Attached>>,
    observers: Mutex<Vec<mpsc::UnboundedSender<MutationRecord>>>,
    broken_selectors: Mutex<HashSet<String>>,
}

impl VirtualDocument {
    pub fn new(location: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            location: Mutex::new(location.into()),
            elements: Mutex::new(Vec::new()),
            observers: Mutex::new(Vec::new()),
            broken_selectors: Mutex::new(HashSet::new()),
        })
    }

    /// History-API navigation: change the location without a reload.
    ///
    /// Like a real single-page app, the route change re-renders part of the
    /// page, so observers see a mutation.
    pub fn navigate(&self, location: impl Into<String>) {
        *self.location.lock() = location.into();
        self.notify(MutationRecord::empty());
    }

    /// Attach a new element answering to the given selectors
    pub fn attach(&self, selectors: &[&str], markup: &str) -> Arc<VirtualElement> {
        let element = Arc::new(VirtualElement::new(markup));
        self.elements.lock().push(Attached {
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            element: Arc::clone(&element),
        });
        self.notify(MutationRecord {
            added: vec![element.id],
            removed: Vec::new(),
        });
        element
    }

    /// Detach an element, as when the host re-renders it away
    pub fn detach(&self, element: &VirtualElement) {
        element.connected.store(false, Ordering::Release);
        self.elements.lock().retain(|a| a.element.id != element.id);
        self.notify(MutationRecord {
            added: Vec::new(),
            removed: vec![element.id],
        });
    }

    /// An unrelated subtree change
    pub fn touch(&self) {
        self.notify(MutationRecord::empty());
    }

    /// Make queries for a selector fail, as a malformed or hostile page would
    pub fn break_selector(&self, selector: &str) {
        self.broken_selectors.lock().insert(selector.to_string());
    }

    /// Number of live mutation subscriptions
    pub fn observer_count(&self) -> usize {
        let mut observers = self.observers.lock();
        observers.retain(|tx| !tx.is_closed());
        observers.len()
    }

    fn notify(&self, record: MutationRecord) {
        self.observers
            .lock()
            .retain(|tx| tx.send(record.clone()).is_ok());
    }
}

impl Document for VirtualDocument {
    fn location(&self) -> String {
        self.location.lock().clone()
    }

    fn query(&self, selector: &str) -> Result<Option<Arc<dyn Element>>> {
        if self.broken_selectors.lock().contains(selector) {
            return Err(Error::query(selector, "query rejected by document"));
        }
        let found = self
            .elements
            .lock()
            .iter()
            .find(|a| a.selectors.iter().any(|s| s == selector))
            .map(|a| Arc::clone(&a.element) as Arc<dyn Element>);
        Ok(found)
    }

    fn observe_mutations(&self) -> MutationReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.lock().push(tx);
        rx
    }
}
