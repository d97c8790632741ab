/// Config schema types (twitch, telegram, reconciler, display).
use std::{collections::BTreeMap, time::Duration};

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OnairConfig {
    pub twitch: TwitchConfig,
    pub telegram: TelegramConfig,
    pub reconciler: ReconcilerConfig,
    pub display: DisplayConfig,
}

/// Twitch Helix credentials and the watched broadcaster.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitchConfig {
    /// Application client ID from the Twitch developer console.
    pub client_id: String,

    /// Application client secret.
    #[serde(serialize_with = "serialize_secret")]
    pub client_secret: Secret<String>,

    /// Login name of the broadcaster to watch (e.g. "somestreamer").
    pub streamer: String,

    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for TwitchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitchConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("streamer", &self.streamer)
            .finish_non_exhaustive()
    }
}

impl Default for TwitchConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: Secret::new(String::new()),
            streamer: String::new(),
            request_timeout_secs: 20,
        }
    }
}

/// Telegram bot credentials and the destination channel.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Destination chat: a numeric id (`-100...`) or a public `@username`.
    pub channel_id: String,

    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("channel_id", &self.channel_id)
            .finish_non_exhaustive()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            channel_id: String::new(),
            request_timeout_secs: 20,
        }
    }
}

/// Polling cadence, deferred deletion and sink retry tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReconcilerConfig {
    pub poll_interval_secs: u64,
    /// Remove the channel message some time after the broadcast ends.
    pub delete_after_end: bool,
    pub delete_delay_secs: u64,
    /// Attempts per logical sink operation (including the first one).
    pub retry_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_jitter_ms: u64,
}

impl ReconcilerConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Delay before the ended message is removed, or `None` when deletion is off.
    #[must_use]
    pub fn deletion_delay(&self) -> Option<Duration> {
        self.delete_after_end
            .then(|| Duration::from_secs(self.delete_delay_secs))
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            delete_after_end: false,
            delete_delay_secs: 3600,
            retry_attempts: 3,
            retry_base_delay_ms: 2000,
            retry_jitter_ms: 500,
        }
    }
}

/// A single entry of the social links footer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SocialLink {
    pub name: String,
    pub url: String,
}

/// Static presentation settings used when rendering the channel message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Replaces `{streamer}` in the headline and footer. Falls back to `twitch.streamer`.
    pub streamer_name: Option<String>,
    /// Always print hours in durations, even when under one hour.
    pub always_show_hours: bool,
    /// Footer links, shown in order after the broadcast ends.
    pub social_links: Vec<SocialLink>,
    /// Category name → image URL used instead of the stream thumbnail.
    pub category_images: BTreeMap<String, String>,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    /// Bucket size for the thumbnail cache-busting token; 0 disables it.
    pub thumbnail_refresh_secs: u64,

    pub live_headline: String,
    pub ended_footer: String,
    pub watch_button_label: String,
    pub game_label: String,
    pub viewers_label: String,
    pub duration_label: String,
    pub socials_label: String,
    pub hours_unit: String,
    pub minutes_unit: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            streamer_name: None,
            always_show_hours: false,
            social_links: Vec::new(),
            category_images: BTreeMap::new(),
            thumbnail_width: 1920,
            thumbnail_height: 1080,
            thumbnail_refresh_secs: 0,
            live_headline: "The stream is live:".into(),
            ended_footer: "🩶 Thanks for watching, see you next time!".into(),
            watch_button_label: "Watch stream".into(),
            game_label: "Game".into(),
            viewers_label: "Viewers".into(),
            duration_label: "Duration".into(),
            socials_label: "Socials:".into(),
            hours_unit: "h".into(),
            minutes_unit: "min".into(),
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}
