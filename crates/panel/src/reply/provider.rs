use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use snafu::Snafu;
use tokio::sync::{mpsc, oneshot};

use crate::chat::{Action, Message, ReplyId, SessionId};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
pub type ReplyResult<T> = Result<T, ReplyError>;

/// Everything a provider gets to answer one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    pub reply_id: ReplyId,
    pub session_id: SessionId,
    pub prompt: String,
    /// Session log up to and including the prompt.
    pub history: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    pub title: String,
    pub body: String,
}

impl AssistantReply {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ReplyError {
    #[snafu(display("reply {reply_id} timed out after {timeout_ms} ms"))]
    TimedOut {
        stage: &'static str,
        reply_id: ReplyId,
        timeout_ms: u64,
    },
    #[snafu(display("provider '{provider_id}' failed to generate a reply: {message}"))]
    Generation {
        stage: &'static str,
        provider_id: String,
        message: String,
    },
}

/// Produces assistant replies. Implementations must be cancel-safe: the
/// returned future may be dropped at any await point.
pub trait ReplyProvider: Send + Sync {
    fn id(&self) -> &str;
    fn generate<'a>(&'a self, request: ReplyRequest)
    -> BoxFuture<'a, ReplyResult<AssistantReply>>;
}

/// Result of one reply worker, routed back by `reply_id`.
#[derive(Debug)]
pub struct ReplyOutcome {
    pub reply_id: ReplyId,
    pub session_id: SessionId,
    pub result: ReplyResult<AssistantReply>,
}

impl ReplyOutcome {
    /// Maps the outcome onto the reducer's reply actions.
    pub fn into_action(self) -> Action {
        match self.result {
            Ok(reply) => Action::ReplyReceived {
                reply_id: self.reply_id,
                title: reply.title,
                body: reply.body,
            },
            Err(error) => Action::ReplyFailed {
                reply_id: self.reply_id,
                reason: error.to_string(),
            },
        }
    }
}

/// Owner of one in-flight reply. Dropping it cancels the worker.
pub struct ReplyHandle {
    reply_id: ReplyId,
    cancel_tx: Option<oneshot::Sender<()>>,
}

impl ReplyHandle {
    /// Signals the worker to stop. Returns `false` when there was nothing
    /// left to signal.
    pub fn cancel(&mut self) -> bool {
        let Some(cancel_tx) = self.cancel_tx.take() else {
            return false;
        };
        tracing::trace!(reply_id = %self.reply_id, "cancel signalled");
        cancel_tx.send(()).is_ok()
    }
}

impl Drop for ReplyHandle {
    fn drop(&mut self) {
        if let Some(cancel_tx) = self.cancel_tx.take() {
            let _ = cancel_tx.send(());
        }
    }
}

/// Starts generating the reply for `request` on the tokio runtime.
///
/// Exactly one `ReplyOutcome` is sent unless the handle cancels first.
pub fn spawn_reply(
    provider: Arc<dyn ReplyProvider>,
    request: ReplyRequest,
    timeout: Duration,
    outcome_tx: mpsc::UnboundedSender<ReplyOutcome>,
) -> ReplyHandle {
    let (cancel_tx, cancel_rx) = oneshot::channel();
    let reply_id = request.reply_id;
    tokio::spawn(run_reply_worker(
        provider, request, timeout, outcome_tx, cancel_rx,
    ));

    ReplyHandle {
        reply_id,
        cancel_tx: Some(cancel_tx),
    }
}

async fn run_reply_worker(
    provider: Arc<dyn ReplyProvider>,
    request: ReplyRequest,
    timeout: Duration,
    outcome_tx: mpsc::UnboundedSender<ReplyOutcome>,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    let reply_id = request.reply_id;
    let session_id = request.session_id;
    let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

    tokio::select! {
        _ = &mut cancel_rx => {
            tracing::debug!(reply_id = %reply_id, session_id = %session_id, "reply cancelled");
        }
        generated = tokio::time::timeout(timeout, provider.generate(request)) => {
            let result = match generated {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        reply_id = %reply_id,
                        session_id = %session_id,
                        provider_id = %provider.id(),
                        timeout_ms,
                        "reply timed out"
                    );
                    TimedOutSnafu {
                        stage: "await-reply",
                        reply_id,
                        timeout_ms,
                    }
                    .fail()
                }
            };

            if outcome_tx
                .send(ReplyOutcome {
                    reply_id,
                    session_id,
                    result,
                })
                .is_err()
            {
                tracing::debug!(reply_id = %reply_id, "reply outcome dropped; bridge is gone");
            }
        }
    }
}
