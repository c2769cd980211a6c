use serde::{Deserialize, Serialize};

use crate::chat::message::{ReplyId, SessionId};

/// Lifecycle event pushed by the host application, e.g. from a menu command.
///
/// Wire names follow the host protocol: `{"type": "newSession"}` and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostEvent {
    #[serde(rename = "newSession")]
    NewSession,
    #[serde(rename = "chatList")]
    ShowList,
    #[serde(rename = "settings")]
    OpenSettings,
}

/// Every input the reducer understands.
///
/// Variants that name a session or reply are ignored when that id is unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Appends a user message to the active session. Blank text is ignored.
    AddUserMessage { text: String },
    /// Appends an assistant message to the active session.
    AddAssistantMessage { title: String, body: String },
    /// Flips one message index in the active session's expansion set.
    ToggleExpand { index: usize },
    Host(HostEvent),
    /// In-panel "new chat"; same effect as `HostEvent::NewSession`.
    CreateSession,
    /// Header back button.
    Back,
    SwitchSession { session_id: SessionId },
    DeleteSession { session_id: SessionId },
    RenameSession { session_id: SessionId, title: String },
    /// User submit: appends the prompt and opens a tagged pending reply, or
    /// queues the prompt when the active session is still waiting on one.
    SendPrompt { text: String },
    ReplyReceived {
        reply_id: ReplyId,
        title: String,
        body: String,
    },
    ReplyFailed { reply_id: ReplyId, reason: String },
}

impl From<HostEvent> for Action {
    fn from(event: HostEvent) -> Self {
        Self::Host(event)
    }
}

impl Action {
    /// Short label used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddUserMessage { .. } => "add-user-message",
            Self::AddAssistantMessage { .. } => "add-assistant-message",
            Self::ToggleExpand { .. } => "toggle-expand",
            Self::Host(HostEvent::NewSession) => "host-new-session",
            Self::Host(HostEvent::ShowList) => "host-show-list",
            Self::Host(HostEvent::OpenSettings) => "host-open-settings",
            Self::CreateSession => "create-session",
            Self::Back => "back",
            Self::SwitchSession { .. } => "switch-session",
            Self::DeleteSession { .. } => "delete-session",
            Self::RenameSession { .. } => "rename-session",
            Self::SendPrompt { .. } => "send-prompt",
            Self::ReplyReceived { .. } => "reply-received",
            Self::ReplyFailed { .. } => "reply-failed",
        }
    }
}
