use std::time::Duration;

use {
    async_trait::async_trait,
    onair_config::TelegramConfig,
    onair_reconciler::{
        CaptionFormat, MessageId, MessageSink, RenderedContent, SinkError, SinkResult,
    },
    secrecy::ExposeSecret,
    teloxide::{
        payloads::{EditMessageCaptionSetters, EditMessageMediaSetters, SendPhotoSetters},
        prelude::*,
        types::{
            ChatId, InputFile, InputMedia, InputMediaPhoto, MessageId as TgMessageId, ParseMode,
            Recipient,
        },
    },
    tracing::{debug, info},
};

use crate::{
    classify::classify,
    error::{Error, Result},
    keyboard::inline_keyboard,
};

/// Sink that keeps a photo message in one Telegram chat.
///
/// Each trait call is exactly one Bot API request.
pub struct TelegramSink {
    bot: Bot,
    chat: Recipient,
}

impl TelegramSink {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let chat = parse_recipient(&config.channel_id)?;
        let client = teloxide::net::default_reqwest_settings()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()?;
        let bot = Bot::with_client(config.token.expose_secret(), client);
        Ok(Self { bot, chat })
    }

    /// Check the token with `getMe` and return the bot's username.
    pub async fn verify(&self) -> Result<String> {
        let me = self.bot.get_me().await?;
        let username = me.user.username.clone().unwrap_or_default();
        info!(username = %username, chat = ?self.chat, "telegram bot connected");
        Ok(username)
    }
}

/// `-100123` → chat id, `@name` → public username.
pub fn parse_recipient(channel: &str) -> Result<Recipient> {
    let channel = channel.trim();
    if channel.len() > 1 && channel.starts_with('@') {
        return Ok(Recipient::ChannelUsername(channel.to_string()));
    }
    channel
        .parse::<i64>()
        .map(|id| Recipient::Id(ChatId(id)))
        .map_err(|_| Error::InvalidChannel {
            channel: channel.to_string(),
        })
}

fn parse_mode(format: CaptionFormat) -> Option<ParseMode> {
    match format {
        CaptionFormat::Markup => Some(ParseMode::MarkdownV2),
        CaptionFormat::Plain => None,
    }
}

fn photo(media: &str) -> SinkResult<InputFile> {
    reqwest::Url::parse(media)
        .map(InputFile::url)
        .map_err(|e| SinkError::external(format!("invalid media url `{media}`"), e))
}

#[async_trait]
impl MessageSink for TelegramSink {
    async fn create(
        &self,
        content: &RenderedContent,
        format: CaptionFormat,
    ) -> SinkResult<MessageId> {
        let mut req = self
            .bot
            .send_photo(self.chat.clone(), photo(&content.media)?)
            .caption(content.caption.clone());
        if let Some(mode) = parse_mode(format) {
            req = req.parse_mode(mode);
        }
        if let Some(markup) = content.buttons.as_ref().and_then(inline_keyboard) {
            req = req.reply_markup(markup);
        }

        let message = req.await.map_err(classify)?;
        debug!(message_id = message.id.0, "telegram photo sent");
        Ok(MessageId(message.id.0))
    }

    async fn replace_media(
        &self,
        id: MessageId,
        content: &RenderedContent,
        format: CaptionFormat,
    ) -> SinkResult<()> {
        let mut media =
            InputMediaPhoto::new(photo(&content.media)?).caption(content.caption.clone());
        if let Some(mode) = parse_mode(format) {
            media = media.parse_mode(mode);
        }
        let mut req = self.bot.edit_message_media(
            self.chat.clone(),
            TgMessageId(id.0),
            InputMedia::Photo(media),
        );
        // Without a markup the existing keyboard is removed.
        if let Some(markup) = content.buttons.as_ref().and_then(inline_keyboard) {
            req = req.reply_markup(markup);
        }

        req.await.map_err(classify)?;
        Ok(())
    }

    async fn update_caption(
        &self,
        id: MessageId,
        content: &RenderedContent,
        format: CaptionFormat,
    ) -> SinkResult<()> {
        let mut req = self
            .bot
            .edit_message_caption(self.chat.clone(), TgMessageId(id.0))
            .caption(content.caption.clone());
        if let Some(mode) = parse_mode(format) {
            req = req.parse_mode(mode);
        }
        if let Some(markup) = content.buttons.as_ref().and_then(inline_keyboard) {
            req = req.reply_markup(markup);
        }

        req.await.map_err(classify)?;
        Ok(())
    }

    async fn delete(&self, id: MessageId) -> SinkResult<()> {
        self.bot
            .delete_message(self.chat.clone(), TgMessageId(id.0))
            .await
            .map_err(classify)?;
        Ok(())
    }
}
