use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Telegram(#[from] teloxide::RequestError),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error("invalid channel `{channel}`: expected a numeric chat id or @username")]
    InvalidChannel { channel: String },
}

pub type Result<T> = std::result::Result<T, Error>;
