//! Error types for credential decoding.

/// Why a credential string could not be decoded.
///
/// These never escape [`TokenCodec::is_expired`](crate::TokenCodec::is_expired),
/// which folds every decoding failure into "expired". They are only
/// visible to callers that ask for the claims themselves.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The string does not split into exactly three non-empty segments.
    #[error("malformed credential: expected 3 segments, found {0}")]
    Malformed(usize),

    /// The payload segment is not valid base64url.
    #[error("payload is not base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// The payload decoded but is not a JSON claims object.
    #[error("payload is not a claims object: {0}")]
    Payload(#[from] serde_json::Error),
}
