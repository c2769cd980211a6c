use std::time::Duration;

use crate::reply::provider::{AssistantReply, BoxFuture, ReplyProvider, ReplyRequest, ReplyResult};
use crate::settings::PanelSettings;

pub const PLACEHOLDER_PROVIDER_ID: &str = "placeholder";

/// Canned replies standing in for a real model backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderReplies {
    delay: Duration,
    title: String,
    body: String,
}

impl PlaceholderReplies {
    pub fn new(delay: Duration, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            delay,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn from_settings(settings: &PanelSettings) -> Self {
        Self::new(
            settings.placeholder_delay(),
            settings.placeholder_title.clone(),
            settings.placeholder_body.clone(),
        )
    }
}

impl Default for PlaceholderReplies {
    fn default() -> Self {
        Self::from_settings(&PanelSettings::default())
    }
}

impl ReplyProvider for PlaceholderReplies {
    fn id(&self) -> &str {
        PLACEHOLDER_PROVIDER_ID
    }

    fn generate<'a>(
        &'a self,
        request: ReplyRequest,
    ) -> BoxFuture<'a, ReplyResult<AssistantReply>> {
        Box::pin(async move {
            tracing::trace!(
                reply_id = %request.reply_id,
                prompt_len = request.prompt.len(),
                "placeholder reply scheduled"
            );
            tokio::time::sleep(self.delay).await;
            Ok(AssistantReply::new(self.title.clone(), self.body.clone()))
        })
    }
}
