//! Per-conversation session state held by the controller

use draftkeep_host::ConversationId;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

use crate::binder::BoundSurface;

/// Where the controller is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Not on a conversation view
    #[default]
    Idle,
    /// Conversation known, composer not bound yet
    Searching,
    /// Composer bound, listeners live
    Bound,
}

/// Content captured at input time, waiting for its debounce timer
pub(crate) struct PendingSave {
    pub ticket: u64,
    pub conversation: ConversationId,
    pub content: String,
    pub timer: CancellationToken,
}

/// In-memory state for the active conversation; never persisted
#[derive(Default)]
pub(crate) struct Session {
    pub active: Option<ConversationId>,
    pub surface: Option<BoundSurface>,
    pub pending_save: Option<PendingSave>,
    /// Outstanding send checks by ticket
    pub send_checks: HashMap<u64, CancellationToken>,
    /// The stored draft was already read for this conversation entry
    pub prefilled: bool,
}

impl Session {
    pub fn phase(&self) -> Phase {
        match (&self.active, &self.surface) {
            (None, _) => Phase::Idle,
            (Some(_), None) => Phase::Searching,
            (Some(_), Some(_)) => Phase::Bound,
        }
    }

    /// Whether a surface is bound for exactly this conversation
    pub fn is_bound_to(&self, conversation: &ConversationId) -> bool {
        self.surface.is_some() && self.active.as_ref() == Some(conversation)
    }

    pub fn cancel_pending_save(&mut self) {
        if let Some(pending) = self.pending_save.take() {
            pending.timer.cancel();
        }
    }

    /// Cancel every timer and forget the conversation.
    ///
    /// Listener removal is the binder's job; this only drops the handle.
    pub fn reset(&mut self) {
        self.cancel_pending_save();
        for (_, timer) in self.send_checks.drain() {
            timer.cancel();
        }
        self.surface = None;
        self.active = None;
        self.prefilled = false;
    }
}
