use std::{error::Error as StdError, time::Duration};

use thiserror::Error;

/// The snapshot source could not determine the broadcast state.
///
/// The reconciler treats this exactly like "not live" for the tick.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("{message}")]
    Message { message: String },

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl QueryError {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

/// Closed set of failures a message sink can report.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Flood control; the sink asked us to wait.
    #[error("rate limited, retry after {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// The edit would not change anything. Counts as applied.
    #[error("message is not modified")]
    NotModified,

    /// The tracked message no longer exists.
    #[error("message not found")]
    NotFound,

    /// The caption was rejected by the sink's markup parser.
    #[error("malformed content: {message}")]
    MalformedContent { message: String },

    #[error("{message}")]
    Other {
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl SinkError {
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedContent {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn external(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether repeating the same request can succeed.
    ///
    /// `NotModified` and `NotFound` are answers, not hiccups: they are
    /// resolved by the caller instead of being retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NotModified | Self::NotFound)
    }
}

pub type SinkResult<T> = Result<T, SinkError>;
