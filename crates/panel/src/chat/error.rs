use snafu::Snafu;

use crate::chat::message::{ReplyId, SessionId};

/// Reasons an action had no effect.
///
/// The reducer never returns these; they are logged and the state is left as is.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ChatError {
    #[snafu(display("session {session_id} does not exist"))]
    InvalidReference {
        stage: &'static str,
        session_id: SessionId,
    },
    #[snafu(display("reply {reply_id} is not pending in any session"))]
    UnknownReply {
        stage: &'static str,
        reply_id: ReplyId,
    },
    #[snafu(display("{field} is empty"))]
    EmptyInput {
        stage: &'static str,
        field: &'static str,
    },
    #[snafu(display("no session is active"))]
    NoActiveSession { stage: &'static str },
}

pub type ChatResult<T> = Result<T, ChatError>;
