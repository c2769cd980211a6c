/// Reasons an action was ignored.
pub mod error;
/// Host events and the reducer's action set.
pub mod events;
pub mod expansion;
/// Session and message value types.
pub mod message;
pub mod router;
pub mod session;
/// Application state and the pure transition function.
pub mod state;
pub mod title_edit;

pub use error::{ChatError, ChatResult};
pub use events::{Action, HostEvent};
pub use expansion::ExpansionSet;
pub use message::{AssistantContent, Message, PendingReply, ReplyId, Session, SessionId};
pub use router::{Route, View};
pub use session::{DEFAULT_SESSION_TITLE_PREFIX, SessionRepository, default_session_title};
pub use state::{AppState, REPLY_FAILED_TITLE, transition};
pub use title_edit::TitleEdit;
