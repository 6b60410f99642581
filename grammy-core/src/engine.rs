//! The engine actor - one owner for all suggestion state.
//!
//! Edits, accepts, timer expiry and checker completions all arrive as
//! [`Message`]s on one queue and are handled one at a time, so no handler
//! ever observes a half-updated set. Only the debounce sleep and the checker
//! call run as separate tasks, and both report back through the same queue.

use std::sync::Arc;
use std::time::Duration;

use grammy_api::{EngineEvent, RawMatch, Status, Suggestion, SuggestionId};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::checker::Checker;
use crate::config::EngineConfig;
use crate::error::{AcceptError, CheckerError, EngineClosed};
use crate::normalize::normalize;
use crate::overlap::resolve;
use crate::registry::SuggestionRegistry;
use crate::render::{RenderSync, Surface};
use crate::scheduler::{CheckScheduler, Completion, Effect, Epoch, SchedulerState, Verdict};

/// Capacity of the outbound event channel.
const EVENT_CAPACITY: usize = 256;

/// Inputs to the engine.
#[derive(Debug)]
pub enum Message {
    /// The surface reports new content.
    ContentChanged(String),

    /// The user accepted a suggestion. `text` is what the surface shows at
    /// the moment of the click.
    Accept { id: SuggestionId, text: String },

    /// Pointer entered a suggestion span, or left all of them.
    Hover(Option<SuggestionId>),

    /// Check the current text again without an edit.
    Recheck,

    /// A debounce timer expired.
    DebounceElapsed(Epoch),

    /// A checker request settled.
    CheckFinished {
        epoch: Epoch,
        snapshot: String,
        result: Result<Vec<RawMatch>, CheckerError>,
    },

    /// Cancel outstanding work and stop the actor.
    Shutdown,
}

/// Cloneable sender for feeding the engine from UI callbacks.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<Message>,
}

impl EngineHandle {
    pub fn send(&self, message: Message) -> Result<(), EngineClosed> {
        self.tx.send(message).map_err(|_| EngineClosed)
    }

    pub fn content_changed(&self, text: impl Into<String>) -> Result<(), EngineClosed> {
        self.send(Message::ContentChanged(text.into()))
    }

    pub fn accept(&self, id: SuggestionId, text: impl Into<String>) -> Result<(), EngineClosed> {
        self.send(Message::Accept {
            id,
            text: text.into(),
        })
    }

    pub fn hover(&self, id: Option<SuggestionId>) -> Result<(), EngineClosed> {
        self.send(Message::Hover(id))
    }

    pub fn recheck(&self) -> Result<(), EngineClosed> {
        self.send(Message::Recheck)
    }

    pub fn shutdown(&self) -> Result<(), EngineClosed> {
        self.send(Message::Shutdown)
    }
}

/// The suggestion synchronization engine.
pub struct Engine<S> {
    checker: Arc<dyn Checker>,
    surface: S,
    registry: SuggestionRegistry,
    scheduler: CheckScheduler,
    render: RenderSync,

    /// Mirror of the surface's content.
    live_text: String,
    hovered: Option<SuggestionId>,
    status: Status,

    /// Armed debounce timer.
    debounce: Option<(Epoch, JoinHandle<()>)>,
    /// Outstanding checker request.
    in_flight: Option<(Epoch, CancellationToken)>,

    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
    event_tx: broadcast::Sender<EngineEvent>,
}

impl<S: Surface> Engine<S> {
    /// Create an engine drawing on `surface` and an event receiver.
    pub fn new(
        config: EngineConfig,
        checker: Arc<dyn Checker>,
        surface: S,
    ) -> (Self, broadcast::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = broadcast::channel(EVENT_CAPACITY);

        tracing::debug!(
            "Engine initialized, checker={}, debounce={:?}",
            checker.name(),
            config.debounce
        );

        let engine = Self {
            checker,
            surface,
            registry: SuggestionRegistry::new(),
            scheduler: CheckScheduler::new(config.debounce),
            render: RenderSync::new(),
            live_text: String::new(),
            hovered: None,
            status: Status::Ready,
            debounce: None,
            in_flight: None,
            tx,
            rx,
            event_tx,
        };
        (engine, event_rx)
    }

    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn text(&self) -> &str {
        &self.live_text
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        self.registry.suggestions()
    }

    pub fn hovered(&self) -> Option<SuggestionId> {
        self.hovered
    }

    pub fn scheduler_state(&self) -> &SchedulerState {
        self.scheduler.state()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Process messages until shutdown.
    pub async fn run(mut self) {
        while self.step().await {}
        tracing::debug!("Engine stopped");
    }

    /// Wait for the next message and handle it. Returns `false` once the
    /// engine has shut down.
    pub async fn step(&mut self) -> bool {
        match self.rx.recv().await {
            Some(message) => self.dispatch(message),
            None => false,
        }
    }

    /// Handle one message. Returns `false` on shutdown.
    pub fn dispatch(&mut self, message: Message) -> bool {
        match message {
            Message::ContentChanged(text) => self.on_content_changed(text),
            Message::Accept { id, text } => self.on_accept(id, text),
            Message::Hover(id) => self.on_hover(id),
            Message::Recheck => {
                // Redraw even if nothing changed, in case the surface drifted.
                self.render.invalidate();
                let effects = self.scheduler.on_text_changed();
                self.run_effects(effects);
            }
            Message::DebounceElapsed(epoch) => {
                if self.debounce.as_ref().is_some_and(|(armed, _)| *armed == epoch) {
                    self.debounce = None;
                }
                let effects = self.scheduler.on_debounce_elapsed(epoch, &self.live_text);
                self.run_effects(effects);
            }
            Message::CheckFinished {
                epoch,
                snapshot,
                result,
            } => self.on_check_finished(epoch, snapshot, result),
            Message::Shutdown => {
                let effects = self.scheduler.shutdown();
                self.run_effects(effects);
                return false;
            }
        }
        true
    }

    fn on_content_changed(&mut self, text: String) {
        if text == self.live_text {
            // The surface echoing our own repaint.
            return;
        }
        self.live_text = text;
        self.set_status(Status::Ready);
        let effects = self.scheduler.on_text_changed();
        self.run_effects(effects);
    }

    fn on_accept(&mut self, id: SuggestionId, text: String) {
        let drifted = text != self.live_text;

        match self.registry.accept(id, &text) {
            Ok(accepted) => {
                self.live_text = accepted.text;
                if self.hovered == Some(id) {
                    self.set_hovered(None);
                }
                self.emit(EngineEvent::TextReplaced {
                    text: self.live_text.clone(),
                });

                if drifted {
                    // Edits we have not heard about yet; the rest of the set
                    // may not line up with them.
                    tracing::debug!("Accepted {} over unreported edits, re-checking", id);
                    self.set_status(Status::Ready);
                    let effects = self.scheduler.on_text_changed();
                    self.run_effects(effects);
                    return;
                }

                self.repaint();
                self.emit_suggestions();
                self.set_status(Status::from_count(self.registry.len()));
            }
            Err(AcceptError::StaleSuggestion(_)) => {
                tracing::info!("Suggestion {} is stale, re-checking", id);
                self.live_text = text;
                let effects = self.scheduler.on_text_changed();
                self.run_effects(effects);
                self.set_status(Status::Rechecking);
            }
            Err(err @ AcceptError::NotFound(_)) => {
                tracing::debug!("Accept failed: {}", err);
                self.set_status(Status::Error(err.to_string()));
            }
        }
    }

    fn on_hover(&mut self, id: Option<SuggestionId>) {
        let next = id.filter(|id| self.registry.contains(*id));
        if next != self.hovered {
            self.set_hovered(next);
            self.repaint();
        }
    }

    fn on_check_finished(
        &mut self,
        epoch: Epoch,
        snapshot: String,
        result: Result<Vec<RawMatch>, CheckerError>,
    ) {
        let verdict = self.scheduler.on_check_finished(
            epoch,
            &snapshot,
            &self.live_text,
            Completion::from(&result),
        );
        if self.in_flight.as_ref().is_some_and(|(e, _)| *e == epoch) {
            self.in_flight = None;
        }

        match verdict {
            Verdict::Apply => {
                let matches = result.unwrap_or_default();
                let set = resolve(normalize(&snapshot, matches));
                tracing::debug!("Check {} produced {} suggestion(s)", epoch, set.len());
                self.registry.replace_all(snapshot, set);
                self.repaint();
                self.emit_suggestions();
                self.set_status(Status::from_count(self.registry.len()));
            }
            Verdict::Failed(message) => {
                tracing::warn!("Check {} failed: {}", epoch, message);
                self.clear_suggestions();
                self.set_status(Status::Error(message));
            }
            Verdict::Discard | Verdict::Cancelled => {}
        }
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::CancelDebounce => {
                    if let Some((_, timer)) = self.debounce.take() {
                        timer.abort();
                    }
                }
                Effect::CancelCheck { epoch } => {
                    if let Some((outstanding, token)) = self.in_flight.take() {
                        tracing::debug!("Cancelling check {} (requested {})", outstanding, epoch);
                        token.cancel();
                    }
                }
                Effect::ClearSuggestions => self.clear_suggestions(),
                Effect::ArmDebounce { epoch, delay } => self.arm_debounce(epoch, delay),
                Effect::IssueCheck { epoch, text } => self.issue_check(epoch, text),
                Effect::Checking => self.set_status(Status::Checking),
                Effect::Ready => self.set_status(Status::Ready),
            }
        }
    }

    fn arm_debounce(&mut self, epoch: Epoch, delay: Duration) {
        let tx = self.tx.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Message::DebounceElapsed(epoch));
        });
        if let Some((_, previous)) = self.debounce.replace((epoch, timer)) {
            previous.abort();
        }
    }

    fn issue_check(&mut self, epoch: Epoch, text: String) {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let checker = Arc::clone(&self.checker);
        let tx = self.tx.clone();

        tracing::debug!("Starting check {} via {}", epoch, checker.name());
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = cancelled.cancelled() => Err(CheckerError::Cancelled),
                result = checker.check(&text) => result,
            };
            let _ = tx.send(Message::CheckFinished {
                epoch,
                snapshot: text,
                result,
            });
        });

        if let Some((_, previous)) = self.in_flight.replace((epoch, token)) {
            previous.cancel();
        }
    }

    fn clear_suggestions(&mut self) {
        let had_suggestions = !self.registry.is_empty();
        self.registry.invalidate(&self.live_text);
        if self.hovered.is_some() {
            self.set_hovered(None);
        }
        self.repaint();
        if had_suggestions {
            self.emit_suggestions();
        }
    }

    fn repaint(&mut self) {
        self.render.repaint(
            &mut self.surface,
            &self.live_text,
            self.registry.suggestions(),
            self.hovered,
        );
    }

    fn set_hovered(&mut self, hovered: Option<SuggestionId>) {
        self.hovered = hovered;
        self.emit(EngineEvent::HoverChanged(hovered));
    }

    fn set_status(&mut self, status: Status) {
        if self.status != status {
            tracing::debug!("Status: {}", status);
            self.status = status.clone();
            self.emit(EngineEvent::StatusChanged(status));
        }
    }

    fn emit_suggestions(&self) {
        self.emit(EngineEvent::SuggestionsChanged {
            suggestions: self.registry.suggestions().to_vec(),
        });
    }

    fn emit(&self, event: EngineEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }
}
