use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{context} returned {status}: {body}")]
    Status {
        context: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
}

impl Error {
    #[must_use]
    pub fn http(context: &'static str, source: reqwest::Error) -> Self {
        Self::Http { context, source }
    }

    /// Whether the API rejected our access token.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == reqwest::StatusCode::UNAUTHORIZED)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
