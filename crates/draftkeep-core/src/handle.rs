//! A cloneable handle for observing and stopping a running controller.

use draftkeep_host::ConversationId;
use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio_util::sync::CancellationToken;

use crate::session::Phase;

#[derive(Debug, Default)]
pub(crate) struct StatusSnapshot {
    pub phase: Phase,
    pub active: Option<ConversationId>,
}

/// A cloneable handle for poking the controller from external code.
///
/// All fields are `Arc`-wrapped, so cloning is cheap.
#[derive(Clone)]
pub struct ControllerHandle {
    pub(crate) cancel: CancellationToken,
    pub(crate) status: Arc<Mutex<StatusSnapshot>>,
    pub(crate) stopped_notify: Arc<tokio::sync::Notify>,
    pub(crate) is_running: Arc<AtomicBool>,
}

impl ControllerHandle {
    pub(crate) fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            status: Arc::new(Mutex::new(StatusSnapshot::default())),
            stopped_notify: Arc::new(tokio::sync::Notify::new()),
            is_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop the controller: listeners are detached and timers cancelled.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Phase as of the last processed event
    pub fn phase(&self) -> Phase {
        self.status.lock().phase
    }

    /// Conversation as of the last processed event
    pub fn active_conversation(&self) -> Option<ConversationId> {
        self.status.lock().active.clone()
    }

    /// Whether the event loop is running
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }

    /// Wait until the event loop has stopped.
    pub async fn wait_for_shutdown(&self) {
        let notified = self.stopped_notify.notified();
        if !self.is_running() {
            return;
        }
        notified.await;
    }

    pub(crate) fn publish(&self, phase: Phase, active: Option<ConversationId>) {
        let mut status = self.status.lock();
        status.phase = phase;
        status.active = active;
    }

    pub(crate) fn mark_running(&self) {
        self.is_running.store(true, Ordering::Release);
    }

    pub(crate) fn mark_stopped(&self) {
        self.is_running.store(false, Ordering::Release);
        self.stopped_notify.notify_waiters();
    }
}
