//! Telegram Bot API message sink.
//!
//! One photo message in one chat, posted with `sendPhoto` and kept current
//! with `editMessageMedia` / `editMessageCaption`.

pub mod classify;
pub mod error;
pub mod keyboard;
pub mod outbound;

pub use {
    error::{Error, Result},
    outbound::TelegramSink,
};
