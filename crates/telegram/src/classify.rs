//! Bot API errors mapped onto the reconciler's sink taxonomy.

use {
    onair_reconciler::SinkError,
    teloxide::{ApiError, RequestError},
};

const PARSE_ENTITIES: &str = "can't parse entities";

/// Classify a failed request.
#[must_use]
pub fn classify(error: RequestError) -> SinkError {
    match error {
        RequestError::RetryAfter(wait) => SinkError::RateLimited {
            retry_after: wait.duration(),
        },
        RequestError::Api(ApiError::MessageNotModified) => SinkError::NotModified,
        RequestError::Api(
            ApiError::MessageToEditNotFound
            | ApiError::MessageToDeleteNotFound
            | ApiError::MessageIdInvalid,
        ) => SinkError::NotFound,
        RequestError::Api(ApiError::CantParseEntities(message)) => SinkError::malformed(message),
        RequestError::Api(ApiError::Unknown(message))
            if message.to_lowercase().contains(PARSE_ENTITIES) =>
        {
            SinkError::malformed(message)
        },
        other => SinkError::external("telegram request failed", other),
    }
}
