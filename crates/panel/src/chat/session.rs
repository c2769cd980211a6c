use serde::Serialize;
use snafu::{OptionExt, ensure};

use crate::chat::error::{ChatResult, EmptyInputSnafu, InvalidReferenceSnafu};
use crate::chat::message::{Message, Session, SessionId};

/// Prefix of the title every new session starts with.
pub const DEFAULT_SESSION_TITLE_PREFIX: &str = "Chat";

pub fn default_session_title(id: SessionId) -> String {
    format!("{DEFAULT_SESSION_TITLE_PREFIX} {id}")
}

/// Ordered session collection with a never-rewinding id counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRepository {
    sessions: Vec<Session>,
    #[serde(skip)]
    next_session_id: u64,
}

impl Default for SessionRepository {
    fn default() -> Self {
        Self {
            sessions: Vec::new(),
            next_session_id: 1,
        }
    }
}

impl SessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fresh empty session and returns it.
    ///
    /// Ids come from a counter rather than `max + 1` over the live sessions, so
    /// deleting the newest session never frees its id.
    pub fn create_session(&mut self) -> &Session {
        let id = SessionId::new(self.next_session_id);
        self.next_session_id = self.next_session_id.saturating_add(1);
        self.sessions.push(Session::new(id, default_session_title(id)));
        tracing::debug!(session_id = %id, "session created");
        &self.sessions[self.sessions.len() - 1]
    }

    /// Appends `message` to the end of the session log and returns its index.
    pub fn append_message(&mut self, session_id: SessionId, message: Message) -> ChatResult<usize> {
        let session = self.get_mut(session_id).context(InvalidReferenceSnafu {
            stage: "append-message",
            session_id,
        })?;
        session.messages.push(message);
        Ok(session.messages.len() - 1)
    }

    /// Replaces the title. A blank title leaves the previous one in place.
    pub fn rename_session(&mut self, session_id: SessionId, title: &str) -> ChatResult<()> {
        let session = self.get_mut(session_id).context(InvalidReferenceSnafu {
            stage: "rename-session",
            session_id,
        })?;
        let title = title.trim();
        ensure!(
            !title.is_empty(),
            EmptyInputSnafu {
                stage: "rename-session",
                field: "session title",
            }
        );
        session.title = title.to_string();
        Ok(())
    }

    /// Removes the session and hands it back.
    pub fn delete_session(&mut self, session_id: SessionId) -> ChatResult<Session> {
        let position = self
            .sessions
            .iter()
            .position(|session| session.id == session_id)
            .context(InvalidReferenceSnafu {
                stage: "delete-session",
                session_id,
            })?;
        Ok(self.sessions.remove(position))
    }

    pub fn get(&self, session_id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|session| session.id == session_id)
    }

    pub fn get_mut(&mut self, session_id: SessionId) -> Option<&mut Session> {
        self.sessions
            .iter_mut()
            .find(|session| session.id == session_id)
    }

    pub fn contains(&self, session_id: SessionId) -> bool {
        self.get(session_id).is_some()
    }

    pub fn first(&self) -> Option<&Session> {
        self.sessions.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|session| session.id).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::chat::error::ChatError;

    #[test]
    fn ids_are_never_reused_after_deletion() {
        let mut repository = SessionRepository::new();
        let first = repository.create_session().id;
        let second = repository.create_session().id;
        repository.delete_session(second).unwrap();
        let third = repository.create_session().id;

        assert_eq!(first, SessionId::new(1));
        assert_eq!(second, SessionId::new(2));
        assert_eq!(third, SessionId::new(3));
    }

    #[test]
    fn interleaved_creates_and_deletes_keep_ids_distinct() {
        let mut repository = SessionRepository::new();
        let mut ever_issued = HashSet::new();

        for round in 0..20u64 {
            let id = repository.create_session().id;
            assert!(ever_issued.insert(id), "id {id} issued twice");

            if round % 3 == 0 {
                let oldest = repository.first().map(|session| session.id).unwrap();
                repository.delete_session(oldest).unwrap();
            }

            let live = repository.ids();
            let unique = live.iter().copied().collect::<HashSet<_>>();
            assert_eq!(live.len(), unique.len());
        }
    }

    #[test]
    fn new_sessions_get_default_titles_and_empty_logs() {
        let mut repository = SessionRepository::new();
        let session = repository.create_session();

        assert_eq!(session.title, "Chat 1");
        assert!(session.messages.is_empty());
        assert!(session.expanded.is_empty());
    }

    #[test]
    fn append_preserves_order() {
        let mut repository = SessionRepository::new();
        let id = repository.create_session().id;

        assert_eq!(repository.append_message(id, Message::user("a")), Ok(0));
        assert_eq!(repository.append_message(id, Message::user("b")), Ok(1));
        assert_eq!(
            repository.get(id).unwrap().messages,
            vec![Message::user("a"), Message::user("b")]
        );
    }

    #[test]
    fn append_to_missing_session_is_invalid_reference() {
        let mut repository = SessionRepository::new();
        let error = repository
            .append_message(SessionId::new(9), Message::user("lost"))
            .unwrap_err();

        assert!(matches!(error, ChatError::InvalidReference { .. }));
    }

    #[test]
    fn blank_rename_keeps_previous_title() {
        let mut repository = SessionRepository::new();
        let id = repository.create_session().id;

        let error = repository.rename_session(id, "   ").unwrap_err();
        assert!(matches!(error, ChatError::EmptyInput { .. }));
        assert_eq!(repository.get(id).unwrap().title, "Chat 1");

        repository.rename_session(id, "  Landing page ").unwrap();
        assert_eq!(repository.get(id).unwrap().title, "Landing page");
    }
}
