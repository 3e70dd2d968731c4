//! Error types for the query layer.

use pulseboard_transport::ApiError;

/// Why one source failed.
///
/// `Clone` because errors live inside [`AggregateResult`](crate::AggregateResult)
/// snapshots that are handed out to every subscriber.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The remote call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The response arrived but did not have the expected shape.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// Anything else, including a fetch task that panicked.
    #[error("{0}")]
    Other(String),
}

impl QueryError {
    /// Text suitable for showing next to the failed widget.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Api(e) => &e.message,
            Self::Decode(_) | Self::Other(_) => pulseboard_transport::UNEXPECTED_ERROR_MESSAGE,
        }
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
