//! Navigation and surface watching driven by mutation notifications
//!
//! A history-API single-page app never reloads, so the only cheap signal
//! that the route changed is the DOM churn that follows. The watcher keeps
//! two independent loops over that churn: the URL loop is always on, the
//! surface loop only while the controller is still looking for a composer.

use draftkeep_host::{Document, MutationRecord};

/// What a mutation means to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchSignal {
    /// The location differs from the last one seen
    Navigated(String),
    /// The controller is searching; try resolving and binding again
    Retry,
}

/// Tracks the last-seen location and whether surface retries are armed
#[derive(Debug)]
pub struct NavigationWatcher {
    last_location: String,
    surface_armed: bool,
}

impl NavigationWatcher {
    pub fn new(initial_location: impl Into<String>) -> Self {
        Self {
            last_location: initial_location.into(),
            surface_armed: false,
        }
    }

    pub fn last_location(&self) -> &str {
        &self.last_location
    }

    /// Start retrying binds on every mutation
    pub fn arm_surface(&mut self) {
        if !self.surface_armed {
            tracing::debug!("Surface watcher armed");
        }
        self.surface_armed = true;
    }

    /// Stop retrying binds
    pub fn disarm_surface(&mut self) {
        if self.surface_armed {
            tracing::debug!("Surface watcher disarmed");
        }
        self.surface_armed = false;
    }

    pub fn is_surface_armed(&self) -> bool {
        self.surface_armed
    }

    /// Interpret one mutation.
    ///
    /// A navigation is reported instead of a retry. The caller must search
    /// itself when the navigation keeps the same conversation.
    pub fn observe(
        &mut self,
        document: &dyn Document,
        _record: &MutationRecord,
    ) -> Vec<WatchSignal> {
        let mut signals = Vec::new();

        let location = document.location();
        if location != self.last_location {
            tracing::debug!("Location changed: {} -> {}", self.last_location, location);
            self.last_location = location.clone();
            signals.push(WatchSignal::Navigated(location));
        } else if self.surface_armed {
            signals.push(WatchSignal::Retry);
        }

        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftkeep_host::VirtualDocument;

    #[test]
    fn test_quiet_when_nothing_changes() {
        let doc = VirtualDocument::new("https://x.com/home");
        let mut watcher = NavigationWatcher::new(doc.location());
        assert!(watcher.observe(&*doc, &MutationRecord::empty()).is_empty());
    }

    #[test]
    fn test_reports_location_change_once() {
        let doc = VirtualDocument::new("https://x.com/home");
        let mut watcher = NavigationWatcher::new(doc.location());
        doc.navigate("https://x.com/messages/1-2");

        let signals = watcher.observe(&*doc, &MutationRecord::empty());
        assert_eq!(
            signals,
            vec![WatchSignal::Navigated("https://x.com/messages/1-2".into())]
        );
        assert!(watcher.observe(&*doc, &MutationRecord::empty()).is_empty());
        assert_eq!(watcher.last_location(), "https://x.com/messages/1-2");
    }

    #[test]
    fn test_retries_only_while_armed() {
        let doc = VirtualDocument::new("u");
        let mut watcher = NavigationWatcher::new("u");

        watcher.arm_surface();
        assert_eq!(
            watcher.observe(&*doc, &MutationRecord::empty()),
            vec![WatchSignal::Retry]
        );

        watcher.disarm_surface();
        assert!(watcher.observe(&*doc, &MutationRecord::empty()).is_empty());
    }

    #[test]
    fn test_navigation_takes_precedence_over_retry() {
        let doc = VirtualDocument::new("a");
        let mut watcher = NavigationWatcher::new("a");
        watcher.arm_surface();
        doc.navigate("b");
        assert_eq!(
            watcher.observe(&*doc, &MutationRecord::empty()),
            vec![WatchSignal::Navigated("b".into())]
        );
    }
}
