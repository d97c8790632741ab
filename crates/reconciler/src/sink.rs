use async_trait::async_trait;

use crate::{
    error::SinkResult,
    render::{Presence, RenderedContent},
};

/// Identity of a message in the destination channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the sink should interpret the caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionFormat {
    /// Telegram MarkdownV2.
    Markup,
    /// No parse mode; the caption is shown verbatim.
    Plain,
}

/// Operations against the destination channel.
///
/// Implementations perform exactly one request per call; retries and
/// fallbacks live in [`crate::dispatch::Dispatcher`].
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Post a new photo message.
    async fn create(
        &self,
        content: &RenderedContent,
        format: CaptionFormat,
    ) -> SinkResult<MessageId>;

    /// Replace image, caption and buttons in one edit.
    async fn replace_media(
        &self,
        id: MessageId,
        content: &RenderedContent,
        format: CaptionFormat,
    ) -> SinkResult<()>;

    /// Replace caption and buttons, keeping the image.
    async fn update_caption(
        &self,
        id: MessageId,
        content: &RenderedContent,
        format: CaptionFormat,
    ) -> SinkResult<()>;

    async fn delete(&self, id: MessageId) -> SinkResult<()>;
}

/// Content last confirmed by the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub content: RenderedContent,
    pub presence: Presence,
}

/// What the reconciler knows about the channel message.
///
/// Only ever updated after the sink reported success.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkState {
    pub message_id: Option<MessageId>,
    pub applied: Option<Applied>,
}

impl SinkState {
    pub fn confirm(&mut self, id: MessageId, content: RenderedContent, presence: Presence) {
        self.message_id = Some(id);
        self.applied = Some(Applied { content, presence });
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
