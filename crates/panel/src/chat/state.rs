use serde::Serialize;
use snafu::{OptionExt, ensure};

use crate::chat::error::{
    ChatResult, EmptyInputSnafu, InvalidReferenceSnafu, NoActiveSessionSnafu, UnknownReplySnafu,
};
use crate::chat::events::{Action, HostEvent};
use crate::chat::expansion::ExpansionSet;
use crate::chat::message::{Message, PendingReply, ReplyId, Session, SessionId};
use crate::chat::router::{Route, View};
use crate::chat::session::SessionRepository;

/// Title of the assistant message that replaces a reply which never arrived.
pub const REPLY_FAILED_TITLE: &str = "Reply failed";

/// Whole panel state. Replaced, never edited, by [`transition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppState {
    sessions: SessionRepository,
    route: Route,
    #[serde(skip)]
    next_reply_id: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Fresh panel state: one empty session, active, on the chat view.
    pub fn new() -> Self {
        let mut sessions = SessionRepository::new();
        let first = sessions.create_session().id;

        Self {
            sessions,
            route: Route::new(View::Chat, Some(first)),
            next_reply_id: 1,
        }
    }

    pub fn sessions(&self) -> &SessionRepository {
        &self.sessions
    }

    pub fn session(&self, session_id: SessionId) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn active_view(&self) -> View {
        self.route.view
    }

    pub fn active_session_id(&self) -> Option<SessionId> {
        self.route.active_session
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.active_session_id()
            .and_then(|session_id| self.sessions.get(session_id))
    }

    /// Expansion set of the session on screen; empty when there is none.
    pub fn expanded(&self) -> ExpansionSet {
        self.active_session()
            .map(|session| session.expanded.clone())
            .unwrap_or_default()
    }

    /// Replies some session is waiting on, in session order.
    pub fn pending_replies(&self) -> Vec<(SessionId, PendingReply)> {
        self.sessions
            .iter()
            .filter_map(|session| session.pending.map(|pending| (session.id, pending)))
            .collect()
    }

    /// Session that owns `reply_id`, if the reply is still wanted.
    pub fn session_awaiting(&self, reply_id: ReplyId) -> Option<&Session> {
        self.sessions.iter().find(|session| {
            session
                .pending
                .is_some_and(|pending| pending.reply_id == reply_id)
        })
    }

    fn require_active(&self, stage: &'static str) -> ChatResult<SessionId> {
        let session_id = self
            .route
            .active_session
            .context(NoActiveSessionSnafu { stage })?;
        ensure!(
            self.sessions.contains(session_id),
            InvalidReferenceSnafu { stage, session_id }
        );
        Ok(session_id)
    }

    fn apply(&mut self, action: Action) -> ChatResult<()> {
        match action {
            Action::AddUserMessage { text } => {
                ensure_not_blank(&text, "add-user-message", "message text")?;
                let session_id = self.require_active("add-user-message")?;
                self.sessions
                    .append_message(session_id, Message::user(text))?;
            }
            Action::AddAssistantMessage { title, body } => {
                let session_id = self.require_active("add-assistant-message")?;
                self.sessions
                    .append_message(session_id, Message::assistant(title, body))?;
            }
            Action::ToggleExpand { index } => {
                let session_id = self.require_active("toggle-expand")?;
                if let Some(session) = self.sessions.get_mut(session_id) {
                    session.expanded = session.expanded.toggled(index);
                }
            }
            Action::Host(HostEvent::NewSession) | Action::CreateSession => {
                let session_id = self.sessions.create_session().id;
                self.route = self.route.enter_chat(session_id);
            }
            Action::Host(HostEvent::ShowList) => self.route = self.route.show_list(),
            Action::Host(HostEvent::OpenSettings) => self.route = self.route.open_settings(),
            Action::Back => self.route = self.route.back(),
            Action::SwitchSession { session_id } => {
                ensure!(
                    self.sessions.contains(session_id),
                    InvalidReferenceSnafu {
                        stage: "switch-session",
                        session_id,
                    }
                );
                self.route = self.route.enter_chat(session_id);
            }
            Action::DeleteSession { session_id } => {
                let removed = self.sessions.delete_session(session_id)?;
                if let Some(pending) = removed.pending {
                    tracing::debug!(
                        session_id = %session_id,
                        reply_id = %pending.reply_id,
                        "deleted session had a pending reply"
                    );
                }
                let fallback = self.sessions.first().map(|session| session.id);
                self.route = self.route.session_removed(session_id, fallback);
            }
            Action::RenameSession { session_id, title } => {
                self.sessions.rename_session(session_id, &title)?;
            }
            Action::SendPrompt { text } => self.send_prompt(text)?,
            Action::ReplyReceived {
                reply_id,
                title,
                body,
            } => self.settle_reply(reply_id, Message::assistant(title, body))?,
            Action::ReplyFailed { reply_id, reason } => {
                self.settle_reply(reply_id, Message::assistant(REPLY_FAILED_TITLE, reason))?
            }
        }

        Ok(())
    }

    fn send_prompt(&mut self, text: String) -> ChatResult<()> {
        ensure_not_blank(&text, "send-prompt", "message text")?;
        let session_id = self.require_active("send-prompt")?;
        let session = self
            .sessions
            .get_mut(session_id)
            .context(InvalidReferenceSnafu {
                stage: "send-prompt",
                session_id,
            })?;

        if session.is_awaiting_reply() {
            session.queued.push_back(text);
            return Ok(());
        }

        let reply_id = allocate_reply_id(&mut self.next_reply_id);
        begin_prompt(session, text, reply_id);
        Ok(())
    }

    /// Lands the answer for `reply_id` in the session that asked for it and
    /// promotes that session's next queued prompt.
    fn settle_reply(&mut self, reply_id: ReplyId, answer: Message) -> ChatResult<()> {
        let session_id = self
            .session_awaiting(reply_id)
            .map(|session| session.id)
            .context(UnknownReplySnafu {
                stage: "settle-reply",
                reply_id,
            })?;
        let next_reply_id = &mut self.next_reply_id;
        let session = self
            .sessions
            .get_mut(session_id)
            .context(InvalidReferenceSnafu {
                stage: "settle-reply",
                session_id,
            })?;

        session.messages.push(answer);
        session.pending = None;

        if let Some(prompt) = session.queued.pop_front() {
            let queued_reply_id = allocate_reply_id(next_reply_id);
            begin_prompt(session, prompt, queued_reply_id);
        }

        Ok(())
    }
}

/// Computes the state after `action`.
///
/// Total over every action: anything that references a missing session or
/// reply, or carries blank text, yields a value equal to `state`.
pub fn transition(state: &AppState, action: Action) -> AppState {
    let name = action.name();
    let mut next = state.clone();

    match next.apply(action) {
        Ok(()) => next,
        Err(error) => {
            tracing::debug!(action = name, error = %error, "action ignored");
            state.clone()
        }
    }
}

fn ensure_not_blank(text: &str, stage: &'static str, field: &'static str) -> ChatResult<()> {
    ensure!(!text.trim().is_empty(), EmptyInputSnafu { stage, field });
    Ok(())
}

fn allocate_reply_id(counter: &mut u64) -> ReplyId {
    let reply_id = ReplyId::new(*counter);
    *counter = counter.saturating_add(1);
    reply_id
}

fn begin_prompt(session: &mut Session, text: String, reply_id: ReplyId) {
    session.messages.push(Message::user(text));
    session.pending = Some(PendingReply {
        reply_id,
        prompt_index: session.messages.len() - 1,
    });
}
