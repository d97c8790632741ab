//! Semantic validation of a loaded configuration.
//!
//! Parsing already guarantees the shape; this catches values that parse
//! fine but would make the bot useless or misbehave at runtime.

use {secrecy::ExposeSecret, url::Url};

use crate::schema::OnairConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "telegram.token"
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] {}", self.severity, self.path, self.message)
    }
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Error, path, message);
    }

    fn warning(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Warning, path, message);
    }

    fn push(&mut self, severity: Severity, path: impl Into<String>, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate a parsed configuration.
#[must_use]
pub fn validate(cfg: &OnairConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    require(&mut result, "twitch.client_id", &cfg.twitch.client_id);
    require(
        &mut result,
        "twitch.client_secret",
        cfg.twitch.client_secret.expose_secret(),
    );
    require(&mut result, "twitch.streamer", &cfg.twitch.streamer);
    require(&mut result, "telegram.token", cfg.telegram.token.expose_secret());
    require(&mut result, "telegram.channel_id", &cfg.telegram.channel_id);

    let channel = cfg.telegram.channel_id.trim();
    if !channel.is_empty() && !channel.starts_with('@') && channel.parse::<i64>().is_err() {
        result.error(
            "telegram.channel_id",
            format!("`{channel}` is neither a numeric chat id nor an @username"),
        );
    }

    let rc = &cfg.reconciler;
    if rc.poll_interval_secs == 0 {
        result.error("reconciler.poll_interval_secs", "must be greater than zero");
    }
    if rc.retry_attempts == 0 {
        result.error("reconciler.retry_attempts", "must be at least 1");
    }
    if rc.delete_after_end && rc.delete_delay_secs < rc.poll_interval_secs {
        result.warning(
            "reconciler.delete_delay_secs",
            "shorter than the poll interval; the ended message may vanish before it is seen",
        );
    }

    for (i, link) in cfg.display.social_links.iter().enumerate() {
        if link.name.trim().is_empty() {
            result.error(format!("display.social_links[{i}].name"), "must not be empty");
        }
        if let Err(e) = Url::parse(&link.url) {
            result.error(
                format!("display.social_links[{i}].url"),
                format!("invalid URL `{}`: {e}", link.url),
            );
        }
    }
    for (category, image) in &cfg.display.category_images {
        if let Err(e) = Url::parse(image) {
            result.error(
                format!("display.category_images.{category}"),
                format!("invalid URL `{image}`: {e}"),
            );
        }
    }
    if cfg.display.thumbnail_width == 0 || cfg.display.thumbnail_height == 0 {
        result.error("display.thumbnail_width", "thumbnail size must be non-zero");
    }

    result
}

fn require(result: &mut ValidationResult, path: &str, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        result.error(path, "required value is missing");
    } else if value.starts_with("${") {
        result.error(path, format!("unresolved environment placeholder {value}"));
    }
}
