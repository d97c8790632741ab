//! Sink update protocol: retries plus the three classified fallbacks.
//!
//! - `NotModified` on an edit counts as applied.
//! - `NotFound` on an edit re-creates the message.
//! - `MalformedContent` surviving every retry resends the caption as plain text.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    detect::SinkOperation,
    error::{SinkError, SinkResult},
    render::RenderedContent,
    retry::RetryPolicy,
    sink::{CaptionFormat, MessageId, MessageSink},
};

pub struct Dispatcher {
    sink: Arc<dyn MessageSink>,
    policy: RetryPolicy,
}

impl Dispatcher {
    pub fn new(sink: Arc<dyn MessageSink>, policy: RetryPolicy) -> Self {
        Self { sink, policy }
    }

    /// Perform `op` and return the id of the message now showing `content`.
    pub async fn apply(
        &self,
        op: SinkOperation,
        current: Option<MessageId>,
        content: &RenderedContent,
    ) -> SinkResult<MessageId> {
        let id = match (op, current) {
            (SinkOperation::Create, _) | (_, None) => return self.create(content).await,
            (_, Some(id)) => id,
        };

        match self.edit(op, id, content).await {
            Ok(()) => Ok(id),
            Err(SinkError::NotFound) => {
                warn!(
                    message_id = %id,
                    operation = op.as_str(),
                    "tracked message is gone, posting a new one"
                );
                self.create(content).await
            },
            Err(e) => Err(e),
        }
    }

    /// Delete `id`; a message that is already gone counts as deleted.
    pub async fn delete(&self, id: MessageId) -> SinkResult<()> {
        let sink = self.sink.as_ref();
        match self.policy.run("delete", || sink.delete(id)).await {
            Err(SinkError::NotFound) => {
                info!(message_id = %id, "message already deleted");
                Ok(())
            },
            other => other,
        }
    }

    async fn create(&self, content: &RenderedContent) -> SinkResult<MessageId> {
        let sink = self.sink.as_ref();
        let result = self
            .policy
            .run("create", || sink.create(content, CaptionFormat::Markup))
            .await;

        match result {
            Err(SinkError::MalformedContent { message }) => {
                warn!(error = %message, "caption rejected, posting as plain text");
                let plain = content.to_plain();
                self.policy
                    .run("create (plain)", || sink.create(&plain, CaptionFormat::Plain))
                    .await
            },
            other => other,
        }
    }

    async fn edit(
        &self,
        op: SinkOperation,
        id: MessageId,
        content: &RenderedContent,
    ) -> SinkResult<()> {
        let result = self.edit_once(op, id, content, CaptionFormat::Markup).await;
        let result = match result {
            Err(SinkError::MalformedContent { message }) => {
                warn!(
                    message_id = %id,
                    operation = op.as_str(),
                    error = %message,
                    "caption rejected, editing as plain text"
                );
                self.edit_once(op, id, &content.to_plain(), CaptionFormat::Plain)
                    .await
            },
            other => other,
        };

        match result {
            Err(SinkError::NotModified) => Ok(()),
            other => other,
        }
    }

    async fn edit_once(
        &self,
        op: SinkOperation,
        id: MessageId,
        content: &RenderedContent,
        format: CaptionFormat,
    ) -> SinkResult<()> {
        let sink = self.sink.as_ref();
        match op {
            SinkOperation::UpdateCaption => {
                self.policy
                    .run("update_caption", || sink.update_caption(id, content, format))
                    .await
            },
            SinkOperation::ReplaceMedia | SinkOperation::Create => {
                self.policy
                    .run("replace_media", || sink.replace_media(id, content, format))
                    .await
            },
        }
    }
}
