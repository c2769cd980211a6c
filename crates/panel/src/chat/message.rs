use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chat::expansion::ExpansionSet;

/// Stable identifier for one session.
///
/// Allocated once by the repository and never handed out again, even after the
/// session is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl SessionId {
    /// Creates a typed session identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier for one assistant reply request.
///
/// Every submit gets a new one so late replies can be routed to the session
/// that asked for them, or dropped when that request is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplyId(pub u64);

impl ReplyId {
    /// Creates a typed reply identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ReplyId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Collapsible assistant payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantContent {
    pub title: String,
    pub body: String,
}

/// One entry of a session log. Identified only by its index in that log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "content", rename_all = "lowercase")]
pub enum Message {
    User(String),
    Assistant(AssistantContent),
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    pub fn assistant(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Assistant(AssistantContent {
            title: title.into(),
            body: body.into(),
        })
    }
}

/// Reply the session is currently waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PendingReply {
    pub reply_id: ReplyId,
    /// Index of the user message this reply answers.
    pub prompt_index: usize,
}

/// One conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    pub messages: Vec<Message>,
    pub expanded: ExpansionSet,
    pub pending: Option<PendingReply>,
    /// Prompts submitted while `pending` was occupied, oldest first.
    pub queued: VecDeque<String>,
}

impl Session {
    /// Creates an empty session with nothing pending.
    pub fn new(id: SessionId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            messages: Vec::new(),
            expanded: ExpansionSet::default(),
            pending: None,
            queued: VecDeque::new(),
        }
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns the prompt text the pending reply answers, if any.
    pub fn pending_prompt(&self) -> Option<&str> {
        let pending = self.pending?;
        match self.messages.get(pending.prompt_index) {
            Some(Message::User(content)) => Some(content.as_str()),
            Some(Message::Assistant(_)) | None => None,
        }
    }
}
