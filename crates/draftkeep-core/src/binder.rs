//! Locating and binding the composition surface
//!
//! Host markup drifts, so every lookup is an ordered [`SelectorChain`]:
//! specific selectors target today's page, generic ones tolerate tomorrow's.
//! The binder never retries; a miss is returned to the caller, which
//! decides when to look again.

use draftkeep_host::{Document, Element, ElementId, EventKind, Listener, ListenerId};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::config::SelectorConfig;

/// Ordered lookup strategies, tried first to last
#[derive(Debug, Clone, Default)]
pub struct SelectorChain {
    selectors: Vec<String>,
}

impl SelectorChain {
    pub fn new<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selectors: selectors.into_iter().map(Into::into).collect(),
        }
    }

    pub fn selectors(&self) -> &[String] {
        &self.selectors
    }

    /// First element matched by any selector, in chain order.
    ///
    /// A selector whose query fails is skipped.
    pub fn find(&self, document: &dyn Document) -> Option<Arc<dyn Element>> {
        for selector in &self.selectors {
            match document.query(selector) {
                Ok(Some(element)) => {
                    tracing::trace!("Matched '{}'", selector);
                    return Some(element);
                }
                Ok(None) => {}
                Err(e) => tracing::debug!("Skipping selector: {}", e),
            }
        }
        None
    }
}

/// Elements found on the page, not yet observed
pub struct LocatedSurface {
    pub composer: Arc<dyn Element>,
    pub send_trigger: Option<Arc<dyn Element>>,
}

/// A surface with live listeners
#[derive(Clone)]
pub struct BoundSurface {
    composer: Arc<dyn Element>,
    send_trigger: Option<Arc<dyn Element>>,
}

impl BoundSurface {
    pub fn composer(&self) -> &Arc<dyn Element> {
        &self.composer
    }

    pub fn has_send_trigger(&self) -> bool {
        self.send_trigger.is_some()
    }

    /// Whether the composer is still attached to the document
    pub fn is_connected(&self) -> bool {
        self.composer.is_connected()
    }

    /// Whether the composer shows no text (whitespace ignored)
    pub fn is_visibly_empty(&self) -> bool {
        self.composer.text_content().trim().is_empty()
    }
}

struct Registration {
    element: Weak<dyn Element>,
    listener: ListenerId,
}

/// Finds the composer and send trigger and manages their listeners
pub struct SurfaceBinder {
    composer: SelectorChain,
    send_trigger: SelectorChain,
    registrations: HashMap<(ElementId, EventKind), Registration>,
}

impl SurfaceBinder {
    pub fn new(composer: SelectorChain, send_trigger: SelectorChain) -> Self {
        Self {
            composer,
            send_trigger,
            registrations: HashMap::new(),
        }
    }

    pub fn from_config(selectors: &SelectorConfig) -> Self {
        Self::new(
            SelectorChain::new(selectors.composer.iter().cloned()),
            SelectorChain::new(selectors.send_trigger.iter().cloned()),
        )
    }

    /// Look for the composer (required) and send trigger (optional)
    pub fn locate(&self, document: &dyn Document) -> Option<LocatedSurface> {
        let composer = self.composer.find(document)?;
        let send_trigger = self.send_trigger.find(document);
        if send_trigger.is_none() {
            tracing::debug!("Composer found without a send trigger");
        }
        Some(LocatedSurface {
            composer,
            send_trigger,
        })
    }

    /// Attach one input listener to the composer and one click listener to
    /// the send trigger.
    ///
    /// Every registration this binder already holds is removed first, so
    /// repeated binds never stack listeners.
    pub fn bind(
        &mut self,
        surface: LocatedSurface,
        on_input: Listener,
        on_send: Listener,
    ) -> BoundSurface {
        self.unbind();

        self.register(&surface.composer, EventKind::Input, on_input);
        if let Some(trigger) = &surface.send_trigger {
            self.register(trigger, EventKind::Click, on_send);
        }

        BoundSurface {
            composer: surface.composer,
            send_trigger: surface.send_trigger,
        }
    }

    /// Remove every listener this binder registered
    pub fn unbind(&mut self) {
        for (_, registration) in self.registrations.drain() {
            if let Some(element) = registration.element.upgrade() {
                element.remove_listener(registration.listener);
            }
        }
    }

    /// Number of listeners currently registered by this binder
    pub fn live_listeners(&self) -> usize {
        self.registrations.len()
    }

    fn register(&mut self, element: &Arc<dyn Element>, kind: EventKind, listener: Listener) {
        let key = (element.id(), kind);
        if let Some(previous) = self.registrations.remove(&key) {
            element.remove_listener(previous.listener);
        }
        let id = element.add_listener(kind, listener);
        self.registrations.insert(
            key,
            Registration {
                element: Arc::downgrade(element),
                listener: id,
            },
        );
    }
}

impl Drop for SurfaceBinder {
    fn drop(&mut self) {
        self.unbind();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftkeep_host::VirtualDocument;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TEXTBOX: &str = "div[role='textbox']";
    const EDITABLE: &str = "div[contenteditable='true']";
    const SEND: &str = "button[data-testid='send']";

    fn binder() -> SurfaceBinder {
        SurfaceBinder::new(
            SelectorChain::new([EDITABLE, TEXTBOX]),
            SelectorChain::new([SEND]),
        )
    }

    fn counter() -> (Arc<AtomicUsize>, Listener) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        (
            hits,
            Arc::new(move || {
                h.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn test_chain_prefers_earlier_selector() {
        let doc = VirtualDocument::new("u");
        let generic = doc.attach(&[TEXTBOX], "");
        let specific = doc.attach(&[EDITABLE], "");
        let chain = SelectorChain::new([EDITABLE, TEXTBOX]);
        assert_eq!(chain.find(&*doc).unwrap().id(), specific.id());

        doc.detach(&specific);
        assert_eq!(chain.find(&*doc).unwrap().id(), generic.id());
    }

    #[test]
    fn test_chain_skips_failing_selector() {
        let doc = VirtualDocument::new("u");
        doc.break_selector(EDITABLE);
        let el = doc.attach(&[TEXTBOX], "");
        let chain = SelectorChain::new([EDITABLE, TEXTBOX]);
        assert_eq!(chain.find(&*doc).unwrap().id(), el.id());
    }

    #[test]
    fn test_locate_misses_without_composer() {
        let doc = VirtualDocument::new("u");
        doc.attach(&[SEND], "");
        assert!(binder().locate(&*doc).is_none());
    }

    #[test]
    fn test_bind_without_send_trigger() {
        let doc = VirtualDocument::new("u");
        let composer = doc.attach(&[TEXTBOX], "");
        let mut binder = binder();
        let located = binder.locate(&*doc).unwrap();
        let (_, input) = counter();
        let (_, send) = counter();

        let bound = binder.bind(located, input, send);
        assert!(!bound.has_send_trigger());
        assert_eq!(composer.listener_count(EventKind::Input), 1);
        assert_eq!(binder.live_listeners(), 1);
    }

    #[test]
    fn test_rebinding_never_stacks_listeners() {
        let doc = VirtualDocument::new("u");
        let composer = doc.attach(&[TEXTBOX], "");
        let trigger = doc.attach(&[SEND], "");
        let mut binder = binder();
        let (inputs, input) = counter();
        let (sends, send) = counter();

        for _ in 0..3 {
            let located = binder.locate(&*doc).unwrap();
            binder.bind(located, Arc::clone(&input), Arc::clone(&send));
        }

        assert_eq!(composer.listener_count(EventKind::Input), 1);
        assert_eq!(trigger.listener_count(EventKind::Click), 1);

        composer.type_html("x");
        trigger.click();
        assert_eq!(inputs.load(Ordering::SeqCst), 1);
        assert_eq!(sends.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unbind_removes_everything() {
        let doc = VirtualDocument::new("u");
        let composer = doc.attach(&[TEXTBOX], "");
        let trigger = doc.attach(&[SEND], "");
        let mut binder = binder();
        let located = binder.locate(&*doc).unwrap();
        let (_, input) = counter();
        let (_, send) = counter();
        binder.bind(located, input, send);

        binder.unbind();
        assert_eq!(composer.listener_count(EventKind::Input), 0);
        assert_eq!(trigger.listener_count(EventKind::Click), 0);
        assert_eq!(binder.live_listeners(), 0);
    }

    #[test]
    fn test_bound_surface_emptiness() {
        let doc = VirtualDocument::new("u");
        let composer = doc.attach(&[TEXTBOX], "<span> </span>");
        let mut binder = binder();
        let located = binder.locate(&*doc).unwrap();
        let (_, input) = counter();
        let (_, send) = counter();
        let bound = binder.bind(located, input, send);

        assert!(bound.is_visibly_empty());
        composer.type_html("<span>hey</span>");
        assert!(!bound.is_visibly_empty());
        doc.detach(&composer);
        assert!(!bound.is_connected());
    }
}
