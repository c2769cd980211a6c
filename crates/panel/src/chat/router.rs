use serde::{Deserialize, Serialize};

use crate::chat::message::SessionId;

/// Top-level screen of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Chat,
    List,
    Settings,
}

/// Which screen is presented and which session the chat screen shows.
///
/// `active_session == None` is the "no session" sentinel; while it holds, the
/// route never rests on `View::Chat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Route {
    pub view: View,
    pub active_session: Option<SessionId>,
}

impl Route {
    pub const fn new(view: View, active_session: Option<SessionId>) -> Self {
        Self {
            view,
            active_session,
        }
    }

    pub fn show_list(self) -> Self {
        Self {
            view: View::List,
            ..self
        }
    }

    pub fn open_settings(self) -> Self {
        Self {
            view: View::Settings,
            ..self
        }
    }

    pub fn enter_chat(self, session_id: SessionId) -> Self {
        Self::new(View::Chat, Some(session_id))
    }

    /// Back navigation from the header button.
    pub fn back(self) -> Self {
        match self.view {
            View::Chat => self.show_list(),
            View::Settings => match self.active_session {
                Some(_) => Self {
                    view: View::Chat,
                    ..self
                },
                None => self.show_list(),
            },
            View::List => self,
        }
    }

    /// Re-establishes a valid active session after `removed` was deleted.
    ///
    /// `fallback` is the first session still in the repository.
    pub fn session_removed(self, removed: SessionId, fallback: Option<SessionId>) -> Self {
        if self.active_session != Some(removed) {
            return self;
        }

        match fallback {
            Some(next) => Self {
                active_session: Some(next),
                ..self
            },
            None => Self {
                view: match self.view {
                    View::Chat => View::List,
                    other => other,
                },
                active_session: None,
            },
        }
    }
}
