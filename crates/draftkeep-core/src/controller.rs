//! Draft lifecycle controller
//!
//! One event loop owns all session state. Mutation notifications, element
//! listeners and timers never act directly; they queue a [`Signal`] and the
//! loop handles signals one at a time. Every deferred signal is checked
//! against the session at handling time, so a timer that outlives its
//! conversation does nothing even if its cancellation was missed.

use draftkeep_host::{
    ConversationId, Document, DraftRecord, Element, EventKind, Listener, Medium, MutationRecord,
    markup,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::{
    binder::{SelectorChain, SurfaceBinder},
    config::DraftkeepConfig,
    error::{Error, Result},
    events::DraftEvent,
    handle::ControllerHandle,
    resolver::ConversationResolver,
    session::{PendingSave, Phase, Session},
    store::{DraftStore, PutOutcome},
    watcher::{NavigationWatcher, WatchSignal},
};

/// Work queued for the event loop
#[derive(Debug)]
enum Signal {
    /// Input on the composer bound in `epoch`; content captured at event time
    Input { epoch: u64, content: String },
    /// Send trigger bound in `epoch` was clicked
    SendClicked { epoch: u64 },
    /// Debounce timer for a pending save fired
    SaveDue { ticket: u64 },
    /// Post-send emptiness check is due
    SendCheckDue {
        ticket: u64,
        conversation: ConversationId,
    },
}

/// Watches a document and keeps drafts for the conversation on screen
pub struct DraftController {
    config: DraftkeepConfig,
    document: Arc<dyn Document>,
    store: DraftStore,
    resolver: ConversationResolver,
    binder: SurfaceBinder,
    peer_label: SelectorChain,
    watcher: NavigationWatcher,
    session: Session,
    /// Bumped on every bind; listeners carry the epoch they were bound in
    epoch: u64,
    next_ticket: u64,
    signal_tx: mpsc::UnboundedSender<Signal>,
    signal_rx: mpsc::UnboundedReceiver<Signal>,
    event_tx: broadcast::Sender<DraftEvent>,
    handle: ControllerHandle,
}

impl DraftController {
    /// Create a controller for a document, persisting through `medium`
    pub fn new(
        config: DraftkeepConfig,
        document: Arc<dyn Document>,
        medium: Arc<dyn Medium>,
    ) -> Result<Self> {
        config.validate()?;
        let resolver = ConversationResolver::new(&config.conversation_pattern)?;
        let store = DraftStore::with_key(medium, config.storage_key.clone());
        let binder = SurfaceBinder::from_config(&config.selectors);
        let peer_label = SelectorChain::new(config.selectors.peer_label.iter().cloned());
        let watcher = NavigationWatcher::new(document.location());
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(256);

        Ok(Self {
            config,
            document,
            store,
            resolver,
            binder,
            peer_label,
            watcher,
            session: Session::default(),
            epoch: 0,
            next_ticket: 0,
            signal_tx,
            signal_rx,
            event_tx,
            handle: ControllerHandle::new(),
        })
    }

    /// Subscribe to controller events
    pub fn subscribe(&self) -> broadcast::Receiver<DraftEvent> {
        self.event_tx.subscribe()
    }

    /// Get a cloneable handle for observing and stopping the controller
    pub fn handle(&self) -> ControllerHandle {
        self.handle.clone()
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn active_conversation(&self) -> Option<&ConversationId> {
        self.session.active.as_ref()
    }

    /// The store this controller writes to
    pub fn store(&self) -> &DraftStore {
        &self.store
    }

    /// Run until [`ControllerHandle::shutdown`] is called.
    ///
    /// Resolves the current location first, then reacts to mutations and
    /// queued signals. On exit all listeners are detached and timers
    /// cancelled.
    pub async fn run(mut self) {
        let cancel = self.handle.cancel.clone();
        let mut mutations = self.document.observe_mutations();
        self.handle.mark_running();
        tracing::debug!("Draft controller started at {}", self.watcher.last_location());

        let location = self.document.location();
        self.navigate(&location).await;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(signal) = self.signal_rx.recv() => self.handle_signal(signal).await,
                record = mutations.recv() => match record {
                    Some(record) => self.handle_mutation(record).await,
                    None => {
                        tracing::debug!("Mutation feed closed, stopping");
                        break;
                    }
                },
            }
        }

        self.teardown();
        self.publish();
        self.handle.mark_stopped();
        tracing::debug!("Draft controller stopped");
    }

    async fn handle_mutation(&mut self, record: MutationRecord) {
        let detached = self.session.surface.as_ref().is_some_and(|s| {
            record.removed.contains(&s.composer().id()) || !s.is_connected()
        });
        if detached {
            self.surface_lost();
        }

        for signal in self.watcher.observe(self.document.as_ref(), &record) {
            match signal {
                WatchSignal::Navigated(location) => {
                    // Same conversation under a new URL: the watcher withheld
                    // its retry, so search here.
                    if !self.navigate(&location).await && self.watcher.is_surface_armed() {
                        self.try_bind().await;
                    }
                }
                WatchSignal::Retry => self.try_bind().await,
            }
        }
    }

    async fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::Input { epoch, content } => self.on_input(epoch, content),
            Signal::SendClicked { epoch } => self.on_send_clicked(epoch),
            Signal::SaveDue { ticket } => self.flush_save(ticket).await,
            Signal::SendCheckDue {
                ticket,
                conversation,
            } => self.check_send(ticket, conversation).await,
        }
    }

    /// React to a new location.
    ///
    /// Same conversation: nothing happens, which keeps re-renders that touch
    /// the URL from causing rebind storms. Different conversation: the
    /// session is torn down and rebuilt. Returns whether the conversation
    /// changed.
    async fn navigate(&mut self, location: &str) -> bool {
        let next = self.resolver.resolve(location);
        if next == self.session.active {
            return false;
        }

        self.teardown();
        tracing::info!(
            "Conversation changed to {}",
            next.as_ref().map(ConversationId::as_str).unwrap_or("none")
        );
        self.session.active = next.clone();
        self.emit(DraftEvent::ConversationChanged { conversation: next });
        self.publish();

        if self.session.active.is_some() {
            self.try_bind().await;
        }
        true
    }

    async fn try_bind(&mut self) {
        let Some(conversation) = self.session.active.clone() else {
            self.watcher.disarm_surface();
            return;
        };
        if self.session.surface.is_some() {
            self.watcher.disarm_surface();
            return;
        }

        let Some(located) = self.binder.locate(self.document.as_ref()) else {
            tracing::debug!("Composer not found for {}, waiting for mutations", conversation);
            self.watcher.arm_surface();
            return;
        };

        self.epoch += 1;
        let on_input = input_listener(&located.composer, self.epoch, self.signal_tx.clone());
        let on_send = send_listener(self.epoch, self.signal_tx.clone());
        let surface = self.binder.bind(located, on_input, on_send);
        if !surface.has_send_trigger() {
            tracing::debug!("No send trigger for {}; drafts will not be retired on send", conversation);
        }
        self.session.surface = Some(surface);
        self.watcher.disarm_surface();

        tracing::info!("Composer bound for {}", conversation);
        self.emit(DraftEvent::SurfaceBound {
            conversation: conversation.clone(),
        });
        self.publish();

        if !self.session.prefilled {
            self.session.prefilled = true;
            self.prefill(&conversation).await;
        }
    }

    /// Inject the stored draft into an empty composer.
    ///
    /// Runs on the first bind of a conversation entry only. A composer
    /// re-rendered later (often right after a send) is left alone.
    ///
    /// Order matters: content first, then caret, then the input
    /// notification that lets the host page's own state catch up.
    async fn prefill(&mut self, conversation: &ConversationId) {
        let record = match self.store.get(conversation).await {
            Ok(Some(record)) => record,
            Ok(None) => return,
            Err(e) => {
                self.report_store_error("load", conversation, &e);
                return;
            }
        };

        if !self.session.is_bound_to(conversation) {
            return;
        }
        let Some(surface) = &self.session.surface else {
            return;
        };
        if !surface.is_visibly_empty() {
            tracing::debug!("Composer for {} already has text, not prefilling", conversation);
            return;
        }

        let composer = surface.composer();
        composer.set_inner_html(&record.content);
        composer.place_caret_at_end();
        composer.dispatch(EventKind::Input);

        tracing::info!("Prefilled draft for {}", conversation);
        self.emit(DraftEvent::Prefilled {
            conversation: conversation.clone(),
        });
    }

    fn on_input(&mut self, epoch: u64, content: String) {
        if epoch != self.epoch || self.session.surface.is_none() {
            tracing::trace!("Ignoring input from stale binding {}", epoch);
            return;
        }
        let Some(conversation) = self.session.active.clone() else {
            return;
        };

        self.session.cancel_pending_save();
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let timer = self.schedule(self.config.debounce(), Signal::SaveDue { ticket });
        self.session.pending_save = Some(PendingSave {
            ticket,
            conversation,
            content,
            timer,
        });
    }

    async fn flush_save(&mut self, ticket: u64) {
        let Some(pending) = self.session.pending_save.take_if(|p| p.ticket == ticket) else {
            tracing::trace!("Save {} superseded", ticket);
            return;
        };
        let conversation = pending.conversation;
        if !self.session.is_bound_to(&conversation) {
            tracing::debug!("Dropping save for {}: no longer bound", conversation);
            return;
        }
        if markup::is_visibly_empty(&pending.content) {
            tracing::debug!("Composer for {} is empty, nothing to save", conversation);
            return;
        }

        let record = DraftRecord::new(
            pending.content,
            self.display_name(&conversation),
            self.document.location(),
        );
        let saved_at = record.saved_at;

        self.emit(DraftEvent::Saving {
            conversation: conversation.clone(),
        });
        match self.store.put(&conversation, record).await {
            Ok(PutOutcome::Written) => {
                tracing::info!("Draft saved for {}", conversation);
                self.emit(DraftEvent::Saved {
                    conversation,
                    saved_at,
                });
            }
            Ok(PutOutcome::Unchanged) => {
                tracing::debug!("Draft for {} unchanged", conversation);
                self.emit(DraftEvent::SaveSkipped { conversation });
            }
            Err(e) => self.report_store_error("save", &conversation, &e),
        }
    }

    fn on_send_clicked(&mut self, epoch: u64) {
        if epoch != self.epoch || self.session.surface.is_none() {
            return;
        }
        let Some(conversation) = self.session.active.clone() else {
            return;
        };

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let timer = self.schedule(
            self.config.send_check_delay(),
            Signal::SendCheckDue {
                ticket,
                conversation,
            },
        );
        self.session.send_checks.insert(ticket, timer);
    }

    /// Post-send heuristic: an empty composer after the delay means the
    /// message went out. There is no acknowledgment from the host page, so
    /// a failed send that also clears the composer still deletes the draft.
    async fn check_send(&mut self, ticket: u64, conversation: ConversationId) {
        if self.session.send_checks.remove(&ticket).is_none() {
            return;
        }
        if !self.session.is_bound_to(&conversation) {
            tracing::debug!("Skipping send check for {}: no longer bound", conversation);
            return;
        }
        let still_has_text = self
            .session
            .surface
            .as_ref()
            .is_some_and(|s| !s.is_visibly_empty());
        if still_has_text {
            tracing::debug!("Composer for {} not empty after send click, keeping draft", conversation);
            self.emit(DraftEvent::SendUnconfirmed { conversation });
            return;
        }

        if self
            .session
            .pending_save
            .as_ref()
            .is_some_and(|p| p.conversation == conversation)
        {
            self.session.cancel_pending_save();
        }

        match self.store.delete(&conversation).await {
            Ok(true) => {
                tracing::info!("Draft deleted for {} after send", conversation);
                self.emit(DraftEvent::DraftDeleted { conversation });
            }
            Ok(false) => tracing::debug!("No draft stored for {}", conversation),
            Err(e) => self.report_store_error("delete", &conversation, &e),
        }
    }

    /// The bound composer was re-rendered away; look for its replacement.
    fn surface_lost(&mut self) {
        let Some(conversation) = self.session.active.clone() else {
            return;
        };
        tracing::debug!("Composer for {} detached, searching again", conversation);
        self.binder.unbind();
        self.session.surface = None;
        self.watcher.arm_surface();
        self.emit(DraftEvent::SurfaceLost { conversation });
        self.publish();
    }

    fn teardown(&mut self) {
        self.binder.unbind();
        self.session.reset();
        self.watcher.disarm_surface();
    }

    /// Peer label from the page, falling back to the conversation id
    fn display_name(&self, conversation: &ConversationId) -> String {
        for selector in self.peer_label.selectors() {
            match self.document.query(selector) {
                Ok(Some(element)) => {
                    let name = element.text_content().trim().to_string();
                    if !name.is_empty() {
                        return name;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Peer label lookup failed, using conversation id: {}", e);
                    break;
                }
            }
        }
        conversation.to_string()
    }

    fn report_store_error(&self, action: &str, conversation: &ConversationId, error: &Error) {
        if error.is_context_invalidated() {
            tracing::debug!("Context gone during {} for {}, aborting", action, conversation);
            return;
        }
        tracing::warn!("Failed to {} draft for {}: {}", action, conversation, error);
        if action == "save" {
            self.emit(DraftEvent::SaveFailed {
                conversation: conversation.clone(),
                message: error.to_string(),
            });
        }
    }

    /// Queue `signal` after `delay` unless the returned token is cancelled
    fn schedule(&self, delay: Duration, signal: Signal) -> CancellationToken {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let tx = self.signal_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = tx.send(signal);
                }
            }
        });
        token
    }

    fn emit(&self, event: DraftEvent) {
        let _ = self.event_tx.send(event);
    }

    fn publish(&self) {
        self.handle
            .publish(self.session.phase(), self.session.active.clone());
    }
}

/// Captures the composer's markup the moment the input event fires
fn input_listener(
    composer: &Arc<dyn Element>,
    epoch: u64,
    tx: mpsc::UnboundedSender<Signal>,
) -> Listener {
    let composer = Arc::downgrade(composer);
    Arc::new(move || {
        if let Some(composer) = composer.upgrade() {
            let _ = tx.send(Signal::Input {
                epoch,
                content: composer.inner_html(),
            });
        }
    })
}

fn send_listener(epoch: u64, tx: mpsc::UnboundedSender<Signal>) -> Listener {
    Arc::new(move || {
        let _ = tx.send(Signal::SendClicked { epoch });
    })
}
