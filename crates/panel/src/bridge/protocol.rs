use serde::{Deserialize, Serialize};

use crate::chat::{Action, HostEvent, SessionId};

/// Intent raised inside the panel by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UserIntent {
    Send { text: String },
    SwitchSession { id: SessionId },
    DeleteSession { id: SessionId },
    RenameSession { id: SessionId, title: String },
    ToggleExpand { index: usize },
    CreateSession,
    Back,
}

impl UserIntent {
    pub fn into_action(self) -> Action {
        match self {
            Self::Send { text } => Action::SendPrompt { text },
            Self::SwitchSession { id } => Action::SwitchSession { session_id: id },
            Self::DeleteSession { id } => Action::DeleteSession { session_id: id },
            Self::RenameSession { id, title } => Action::RenameSession {
                session_id: id,
                title,
            },
            Self::ToggleExpand { index } => Action::ToggleExpand { index },
            Self::CreateSession => Action::CreateSession,
            Self::Back => Action::Back,
        }
    }
}

/// Notification sent from the panel to the host. The host never answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PanelMessage {
    ChatMessage { text: String },
}

/// Anything that can enter the bridge queue.
///
/// Host events and user intents share one queue so they are applied in the
/// order they arrive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PanelInput {
    Host(HostEvent),
    User(UserIntent),
}

impl PanelInput {
    pub fn into_action(self) -> Action {
        match self {
            Self::Host(event) => Action::Host(event),
            Self::User(intent) => intent.into_action(),
        }
    }

    /// Text the host should hear about once this input is applied.
    pub fn host_notification(&self) -> Option<PanelMessage> {
        match self {
            Self::User(UserIntent::Send { text }) if !text.trim().is_empty() => {
                Some(PanelMessage::ChatMessage { text: text.clone() })
            }
            Self::Host(_) | Self::User(_) => None,
        }
    }
}

impl From<HostEvent> for PanelInput {
    fn from(event: HostEvent) -> Self {
        Self::Host(event)
    }
}

impl From<UserIntent> for PanelInput {
    fn from(intent: UserIntent) -> Self {
        Self::User(intent)
    }
}
