mod placeholder;
mod provider;

pub use placeholder::{PLACEHOLDER_PROVIDER_ID, PlaceholderReplies};
pub use provider::{
    AssistantReply, BoxFuture, ReplyError, ReplyHandle, ReplyOutcome, ReplyProvider,
    ReplyRequest, ReplyResult, spawn_reply,
};
