use crate::chat::events::Action;
use crate::chat::message::{Session, SessionId};

/// In-list title editor.
///
/// Editing is display-only until `confirm`; dropping or cancelling the editor
/// dispatches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleEdit {
    session_id: SessionId,
    draft: String,
}

impl TitleEdit {
    /// Enters edit mode prefilled with the current title.
    pub fn begin(session: &Session) -> Self {
        Self {
            session_id: session.id,
            draft: session.title.clone(),
        }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    pub fn confirm(self) -> Action {
        Action::RenameSession {
            session_id: self.session_id,
            title: self.draft,
        }
    }

    pub fn cancel(self) {
        tracing::trace!(session_id = %self.session_id, "title edit cancelled");
    }
}
