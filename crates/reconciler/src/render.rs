//! Pure mapping from a snapshot to the channel message content.

use {
    chrono::{DateTime, Utc},
    onair_config::DisplayConfig,
};

use crate::{
    markup::{self, escape},
    snapshot::StreamSnapshot,
};

/// Which variant of the message is being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Live,
    Ended,
}

/// A single URL button under the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub url: String,
}

/// Rows of buttons, top to bottom.
pub type ButtonLayout = Vec<Vec<Button>>;

/// Everything the sink displays for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedContent {
    pub media: String,
    /// MarkdownV2 caption.
    pub caption: String,
    pub buttons: Option<ButtonLayout>,
}

impl RenderedContent {
    /// Same content with the caption reduced to plain text.
    #[must_use]
    pub fn to_plain(&self) -> Self {
        Self {
            media: self.media.clone(),
            caption: markup::strip_escapes(&self.caption),
            buttons: self.buttons.clone(),
        }
    }
}

/// Renders captions for one broadcaster.
#[derive(Debug, Clone)]
pub struct Renderer {
    display: DisplayConfig,
    streamer: String,
}

impl Renderer {
    pub fn new(display: DisplayConfig, streamer: impl Into<String>) -> Self {
        Self {
            display,
            streamer: streamer.into(),
        }
    }

    fn channel_url(&self) -> String {
        format!("https://www.twitch.tv/{}", self.streamer)
    }

    fn display_name(&self) -> &str {
        self.display
            .streamer_name
            .as_deref()
            .unwrap_or(&self.streamer)
    }

    /// Render `snapshot` as it should appear at `now`.
    #[must_use]
    pub fn render(
        &self,
        snapshot: &StreamSnapshot,
        presence: Presence,
        now: DateTime<Utc>,
    ) -> RenderedContent {
        let d = &self.display;
        let duration = format_duration(
            snapshot.minutes_live(now),
            d.always_show_hours,
            &d.hours_unit,
            &d.minutes_unit,
        );

        let mut lines: Vec<String> = Vec::with_capacity(16);
        match presence {
            Presence::Live => {
                let headline = self.with_name(&d.live_headline);
                if !headline.trim().is_empty() {
                    lines.push(format!("*{}*", escape(&headline)));
                    lines.push(String::new());
                }
                lines.push(format!("_🎬 {}_", escape(&snapshot.title)));
                lines.push(String::new());
                self.push_game(&mut lines, snapshot);
                lines.push(field(&d.viewers_label, &snapshot.viewer_count.to_string()));
                lines.push(field(&d.duration_label, &duration));
            },
            Presence::Ended => {
                lines.push(format!("*🎬 {}*", escape(&snapshot.title)));
                lines.push(String::new());
                self.push_game(&mut lines, snapshot);
                lines.push(field(&d.duration_label, &duration));
                lines.push(String::new());
                lines.push(format!("*{}*", escape(&d.socials_label)));
                for link in &d.social_links {
                    lines.push(link_line(&link.name, &link.url));
                }
                lines.push(link_line("Twitch", &self.channel_url()));
                let footer = self.with_name(&d.ended_footer);
                if !footer.trim().is_empty() {
                    lines.push(String::new());
                    lines.push(format!("_{}_", escape(&footer)));
                }
            },
        }

        let buttons = match presence {
            Presence::Live => Some(vec![vec![Button {
                label: d.watch_button_label.clone(),
                url: self.channel_url(),
            }]]),
            Presence::Ended => None,
        };

        RenderedContent {
            media: self.media(snapshot, now),
            caption: lines.join("\n"),
            buttons,
        }
    }

    fn push_game(&self, lines: &mut Vec<String>, snapshot: &StreamSnapshot) {
        if !snapshot.game.trim().is_empty() {
            lines.push(field(&self.display.game_label, &snapshot.game));
        }
    }

    fn with_name(&self, template: &str) -> String {
        template.replace("{streamer}", self.display_name())
    }

    fn media(&self, snapshot: &StreamSnapshot, now: DateTime<Utc>) -> String {
        let d = &self.display;
        if let Some(image) = d.category_images.get(&snapshot.game) {
            return image.clone();
        }
        let url = snapshot
            .thumbnail_url
            .replace("{width}", &d.thumbnail_width.to_string())
            .replace("{height}", &d.thumbnail_height.to_string());
        if d.thumbnail_refresh_secs == 0 {
            return url;
        }
        let bucket = now.timestamp().max(0) as u64 / d.thumbnail_refresh_secs;
        let sep = if url.contains('?') { '&' } else { '?' };
        format!("{url}{sep}t={bucket}")
    }
}

fn field(label: &str, value: &str) -> String {
    format!("*{}*: *{}*", escape(label), escape(value))
}

fn link_line(label: &str, url: &str) -> String {
    format!("[{}]({})", escape(label), markup::escape_link_target(url))
}

/// `"H h M min"` when there are hours to show, `"M min"` otherwise.
#[must_use]
pub fn format_duration(
    minutes: u64,
    always_show_hours: bool,
    hours_unit: &str,
    minutes_unit: &str,
) -> String {
    let hours = minutes / 60;
    if always_show_hours || hours > 0 {
        format!("{hours} {hours_unit} {} {minutes_unit}", minutes % 60)
    } else {
        format!("{minutes} {minutes_unit}")
    }
}
