use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use snafu::Snafu;
use tokio::sync::mpsc;

use crate::bridge::protocol::{PanelInput, PanelMessage, UserIntent};
use crate::chat::{Action, AppState, HostEvent, PendingReply, ReplyId, SessionId, transition};
use crate::reply::{ReplyHandle, ReplyOutcome, ReplyProvider, ReplyRequest, spawn_reply};
use crate::settings::PanelSettings;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum BridgeError {
    #[snafu(display("panel bridge is closed; dropped input on `{stage}`"))]
    Closed { stage: &'static str },
}

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Published view of the state with a counter that moves on every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    pub revision: u64,
    pub state: AppState,
}

/// Read side for the presentation layer.
#[derive(Clone)]
pub struct StateReader {
    published: Arc<ArcSwap<StateSnapshot>>,
}

impl StateReader {
    pub fn snapshot(&self) -> Arc<StateSnapshot> {
        self.published.load_full()
    }
}

/// Write side handed to the host and to the panel's input widgets.
#[derive(Debug, Clone)]
pub struct BridgeHandle {
    input_tx: mpsc::UnboundedSender<PanelInput>,
}

impl BridgeHandle {
    pub fn post(&self, input: impl Into<PanelInput>) -> BridgeResult<()> {
        self.input_tx
            .send(input.into())
            .map_err(|_| ClosedSnafu { stage: "post-input" }.build())
    }

    pub fn post_host_event(&self, event: HostEvent) -> BridgeResult<()> {
        self.post(event)
    }

    pub fn post_intent(&self, intent: UserIntent) -> BridgeResult<()> {
        self.post(intent)
    }
}

/// Messages the panel sends to the host.
pub struct PanelOutbox {
    messages: mpsc::UnboundedReceiver<PanelMessage>,
}

impl PanelOutbox {
    pub async fn recv(&mut self) -> Option<PanelMessage> {
        self.messages.recv().await
    }

    pub fn try_recv(&mut self) -> Option<PanelMessage> {
        self.messages.try_recv().ok()
    }
}

enum BridgeEvent {
    Input(Option<PanelInput>),
    Reply(ReplyOutcome),
}

/// Single writer of the panel state.
///
/// Host events, user intents and reply outcomes are applied one at a time
/// through [`transition`]; every other component only reads snapshots.
pub struct PanelBridge {
    state: AppState,
    revision: u64,
    published: Arc<ArcSwap<StateSnapshot>>,
    input_rx: mpsc::UnboundedReceiver<PanelInput>,
    outbox_tx: mpsc::UnboundedSender<PanelMessage>,
    outcome_tx: mpsc::UnboundedSender<ReplyOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<ReplyOutcome>,
    provider: Arc<dyn ReplyProvider>,
    reply_timeout: Duration,
    in_flight: HashMap<ReplyId, ReplyHandle>,
}

impl PanelBridge {
    pub fn new(
        settings: &PanelSettings,
        provider: Arc<dyn ReplyProvider>,
    ) -> (Self, BridgeHandle, PanelOutbox, StateReader) {
        let state = AppState::new();
        let published = Arc::new(ArcSwap::from_pointee(StateSnapshot {
            revision: 0,
            state: state.clone(),
        }));
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let bridge = Self {
            state,
            revision: 0,
            published: published.clone(),
            input_rx,
            outbox_tx,
            outcome_tx,
            outcome_rx,
            provider,
            reply_timeout: settings.reply_timeout(),
            in_flight: HashMap::new(),
        };

        (
            bridge,
            BridgeHandle { input_tx },
            PanelOutbox {
                messages: outbox_rx,
            },
            StateReader { published },
        )
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn in_flight_replies(&self) -> Vec<ReplyId> {
        let mut reply_ids = self.in_flight.keys().copied().collect::<Vec<_>>();
        reply_ids.sort();
        reply_ids
    }

    /// Drains the input queue until every [`BridgeHandle`] is dropped.
    ///
    /// Must run on a tokio runtime; replies are spawned onto it.
    pub async fn run(mut self) {
        tracing::info!(provider_id = %self.provider.id(), "panel bridge started");

        loop {
            let event = tokio::select! {
                biased;
                input = self.input_rx.recv() => BridgeEvent::Input(input),
                Some(outcome) = self.outcome_rx.recv() => BridgeEvent::Reply(outcome),
            };

            match event {
                BridgeEvent::Input(Some(input)) => self.handle_input(input),
                BridgeEvent::Input(None) => break,
                BridgeEvent::Reply(outcome) => self.handle_outcome(outcome),
            }
        }

        let abandoned = self.in_flight.len();
        // Dropping the handles cancels the workers.
        self.in_flight.clear();
        tracing::info!(
            abandoned_replies = abandoned,
            revision = self.revision,
            "panel bridge stopped"
        );
    }

    /// Applies one host event or user intent.
    pub fn handle_input(&mut self, input: PanelInput) {
        let notification = input.host_notification();
        let changed = self.apply(input.into_action());

        // The host only hears about sends the panel accepted.
        if let Some(message) = notification.filter(|_| changed) {
            self.forward(message);
        }
    }

    /// Applies one finished reply.
    pub fn handle_outcome(&mut self, outcome: ReplyOutcome) {
        let outcome_id = outcome.reply_id;
        self.in_flight.remove(&outcome.reply_id);
        if !self.apply(outcome.into_action()) {
            tracing::debug!(reply_id = %outcome_id, "reply outcome had no pending request");
        }
    }

    /// Runs the reducer and reports whether the state moved.
    fn apply(&mut self, action: Action) -> bool {
        let name = action.name();
        let next = transition(&self.state, action);
        let changed = next != self.state;

        if changed {
            self.state = next;
            self.revision += 1;
            self.published.store(Arc::new(StateSnapshot {
                revision: self.revision,
                state: self.state.clone(),
            }));
            tracing::debug!(
                action = name,
                revision = self.revision,
                view = ?self.state.active_view(),
                active_session = ?self.state.active_session_id(),
                "panel state changed"
            );
        }

        self.reconcile_replies();
        changed
    }

    /// Keeps one worker per pending reply: spawns the missing ones and
    /// cancels those whose reply is no longer wanted.
    fn reconcile_replies(&mut self) {
        let pending = self.state.pending_replies();
        let wanted = pending
            .iter()
            .map(|(_, pending)| pending.reply_id)
            .collect::<HashSet<_>>();

        self.in_flight.retain(|reply_id, handle| {
            if wanted.contains(reply_id) {
                return true;
            }
            tracing::debug!(reply_id = %reply_id, "cancelling reply that is no longer pending");
            handle.cancel();
            false
        });

        for (session_id, pending) in pending {
            if self.in_flight.contains_key(&pending.reply_id) {
                continue;
            }
            let Some(request) = self.reply_request(session_id, pending) else {
                tracing::warn!(
                    session_id = %session_id,
                    reply_id = %pending.reply_id,
                    "pending reply does not point at a user prompt"
                );
                continue;
            };

            tracing::debug!(
                session_id = %session_id,
                reply_id = %pending.reply_id,
                "requesting assistant reply"
            );
            let handle = spawn_reply(
                self.provider.clone(),
                request,
                self.reply_timeout,
                self.outcome_tx.clone(),
            );
            self.in_flight.insert(pending.reply_id, handle);
        }
    }

    fn reply_request(&self, session_id: SessionId, pending: PendingReply) -> Option<ReplyRequest> {
        let session = self.state.session(session_id)?;
        let prompt = session.pending_prompt()?.to_string();
        let history = session.messages.get(..=pending.prompt_index)?.to_vec();

        Some(ReplyRequest {
            reply_id: pending.reply_id,
            session_id,
            prompt,
            history,
        })
    }

    fn forward(&self, message: PanelMessage) {
        // At-most-once: a host that stopped listening just misses the notice.
        if self.outbox_tx.send(message).is_err() {
            tracing::warn!("host outbox closed; dropping panel message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{Message, REPLY_FAILED_TITLE, View};
    use crate::reply::{AssistantReply, BoxFuture, PlaceholderReplies, ReplyResult};

    struct NeverReplies;

    impl ReplyProvider for NeverReplies {
        fn id(&self) -> &str {
            "never"
        }

        fn generate<'a>(
            &'a self,
            _request: ReplyRequest,
        ) -> BoxFuture<'a, ReplyResult<AssistantReply>> {
            Box::pin(futures::future::pending())
        }
    }

    struct EchoReplies;

    impl ReplyProvider for EchoReplies {
        fn id(&self) -> &str {
            "echo"
        }

        fn generate<'a>(
            &'a self,
            request: ReplyRequest,
        ) -> BoxFuture<'a, ReplyResult<AssistantReply>> {
            Box::pin(async move {
                Ok(AssistantReply::new(
                    format!("echo {}", request.prompt),
                    format!("{} messages", request.history.len()),
                ))
            })
        }
    }

    fn send(text: &str) -> PanelInput {
        PanelInput::User(UserIntent::Send {
            text: text.to_string(),
        })
    }

    fn bridge_with(
        provider: Arc<dyn ReplyProvider>,
    ) -> (PanelBridge, BridgeHandle, PanelOutbox, StateReader) {
        PanelBridge::new(&PanelSettings::default(), provider)
    }

    #[tokio::test(start_paused = true)]
    async fn host_and_user_inputs_apply_in_arrival_order() {
        let (mut bridge, _handle, _outbox, reader) = bridge_with(Arc::new(NeverReplies));

        bridge.handle_input(PanelInput::Host(HostEvent::NewSession));
        bridge.handle_input(send("hello"));
        bridge.handle_input(PanelInput::Host(HostEvent::ShowList));

        let snapshot = reader.snapshot();
        assert_eq!(snapshot.revision, 3);
        assert_eq!(bridge.revision(), snapshot.revision);
        assert_eq!(snapshot.state.active_view(), View::List);
        assert_eq!(snapshot.state.active_session_id(), Some(SessionId::new(2)));
        assert_eq!(
            snapshot.state.session(SessionId::new(2)).unwrap().messages,
            vec![Message::user("hello")]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn send_notifies_host_and_starts_one_reply() {
        let (mut bridge, _handle, mut outbox, _reader) = bridge_with(Arc::new(NeverReplies));

        bridge.handle_input(send("hello"));
        bridge.handle_input(send("again"));

        assert_eq!(
            outbox.try_recv(),
            Some(PanelMessage::ChatMessage {
                text: "hello".to_string()
            })
        );
        assert_eq!(
            outbox.try_recv(),
            Some(PanelMessage::ChatMessage {
                text: "again".to_string()
            })
        );
        assert_eq!(bridge.in_flight_replies(), vec![ReplyId::new(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_send_changes_nothing() {
        let (mut bridge, _handle, mut outbox, reader) = bridge_with(Arc::new(NeverReplies));
        let before = reader.snapshot();

        bridge.handle_input(send("   "));

        assert_eq!(outbox.try_recv(), None);
        assert_eq!(reader.snapshot(), before);
        assert!(bridge.in_flight_replies().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn send_without_a_session_does_not_notify_host() {
        let (mut bridge, _handle, mut outbox, reader) = bridge_with(Arc::new(NeverReplies));

        bridge.handle_input(PanelInput::User(UserIntent::DeleteSession {
            id: SessionId::new(1),
        }));
        let before = reader.snapshot();
        bridge.handle_input(send("hi"));

        assert_eq!(outbox.try_recv(), None);
        assert_eq!(reader.snapshot(), before);
        assert!(bridge.in_flight_replies().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn deleting_session_cancels_its_reply() {
        let (mut bridge, _handle, _outbox, _reader) = bridge_with(Arc::new(NeverReplies));

        bridge.handle_input(send("hello"));
        bridge.handle_input(PanelInput::User(UserIntent::CreateSession));
        assert_eq!(bridge.in_flight_replies(), vec![ReplyId::new(1)]);

        bridge.handle_input(PanelInput::User(UserIntent::DeleteSession {
            id: SessionId::new(1),
        }));
        assert!(bridge.in_flight_replies().is_empty());
        assert_eq!(bridge.state().active_session_id(), Some(SessionId::new(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn closed_outbox_does_not_block_state_changes() {
        let (mut bridge, _handle, outbox, _reader) = bridge_with(Arc::new(NeverReplies));
        drop(outbox);

        bridge.handle_input(send("hello"));
        assert_eq!(
            bridge.state().active_session().unwrap().messages,
            vec![Message::user("hello")]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn run_completes_send_flow_with_placeholder_reply() {
        let (bridge, handle, mut outbox, reader) =
            bridge_with(Arc::new(PlaceholderReplies::default()));
        let task = tokio::spawn(bridge.run());

        handle
            .post_intent(UserIntent::Send {
                text: "simple neobank website".to_string(),
            })
            .unwrap();
        assert_eq!(
            outbox.recv().await,
            Some(PanelMessage::ChatMessage {
                text: "simple neobank website".to_string()
            })
        );

        tokio::time::sleep(Duration::from_millis(600)).await;
        let snapshot = reader.snapshot();
        let session = snapshot.state.active_session().unwrap();
        assert_eq!(
            session.messages,
            vec![
                Message::user("simple neobank website"),
                Message::assistant("Generating...", "Loading..."),
            ]
        );
        assert!(session.pending.is_none());

        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn queued_prompts_are_answered_in_order() {
        let (bridge, handle, _outbox, reader) = bridge_with(Arc::new(EchoReplies));
        let task = tokio::spawn(bridge.run());

        handle.post(send("one")).unwrap();
        handle.post(send("two")).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let snapshot = reader.snapshot();
        assert_eq!(
            snapshot.state.active_session().unwrap().messages,
            vec![
                Message::user("one"),
                Message::assistant("echo one", "1 messages"),
                Message::user("two"),
                Message::assistant("echo two", "3 messages"),
            ]
        );

        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_reply_times_out_into_failure_message() {
        let settings = PanelSettings {
            reply_timeout_ms: 1_000,
            ..PanelSettings::default()
        };
        let (bridge, handle, _outbox, reader) =
            PanelBridge::new(&settings, Arc::new(NeverReplies));
        let task = tokio::spawn(bridge.run());

        handle.post(send("hello")).unwrap();
        tokio::time::sleep(Duration::from_millis(1_500)).await;

        let snapshot = reader.snapshot();
        let session = snapshot.state.active_session().unwrap();
        assert_eq!(
            session.messages[1],
            Message::assistant(REPLY_FAILED_TITLE, "reply 1 timed out after 1000 ms")
        );
        assert!(session.pending.is_none());

        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn posting_after_shutdown_reports_closed_bridge() {
        let (bridge, handle, _outbox, _reader) = bridge_with(Arc::new(NeverReplies));
        drop(bridge);

        let error = handle.post_host_event(HostEvent::NewSession).unwrap_err();
        assert!(matches!(error, BridgeError::Closed { .. }));
    }
}
