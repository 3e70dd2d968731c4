//! Unified error type for Pulseboard.

use pulseboard_query::QueryError;
use pulseboard_session::{SessionError, StoreError};
use pulseboard_token::TokenError;
use pulseboard_transport::ApiError;

/// Invalid configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable that must hold a whole number did not.
    #[error("{var} must be a whole number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `pulseboard` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate. The
/// `#[from]` attributes let `?` convert sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum PulseboardError {
    /// A remote call failed before reaching the session layer.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Login, password reset, or persistence failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The durable store could not be opened.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A credential could not be decoded.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// A metrics source failed.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PulseboardError {
    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.message.clone(),
            Self::Session(e) => e.user_message(),
            Self::Query(e) => e.user_message().to_string(),
            Self::Store(_) | Self::Token(_) | Self::Config(_) => {
                pulseboard_transport::UNEXPECTED_ERROR_MESSAGE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_api_error() {
        let err: PulseboardError = ApiError::transport().into();
        assert!(matches!(err, PulseboardError::Api(_)));
        assert_eq!(err.user_message(), pulseboard_transport::CONNECTION_ERROR_MESSAGE);
    }

    #[test]
    fn test_from_session_error_keeps_service_message() {
        let err: PulseboardError =
            SessionError::Api(ApiError::service(401, "Credenciales inválidas")).into();
        assert!(matches!(err, PulseboardError::Session(_)));
        assert_eq!(err.user_message(), "Credenciales inválidas");
        assert!(err.to_string().contains("Credenciales inválidas"));
    }

    #[test]
    fn test_from_store_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: PulseboardError = StoreError::from(io).into();
        assert!(matches!(err, PulseboardError::Store(_)));
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn test_from_token_error() {
        let err: PulseboardError = TokenError::Malformed(2).into();
        assert!(matches!(err, PulseboardError::Token(_)));
    }

    #[test]
    fn test_from_query_error() {
        let err: PulseboardError = QueryError::Other("down".into()).into();
        assert!(matches!(err, PulseboardError::Query(_)));
        assert_eq!(err.user_message(), pulseboard_transport::UNEXPECTED_ERROR_MESSAGE);
    }

    #[test]
    fn test_from_config_error_names_variable() {
        let err: PulseboardError = ConfigError::InvalidNumber {
            var: "PULSEBOARD_VALIDATE_SECS",
            value: "soon".into(),
        }
        .into();
        assert!(err.to_string().contains("PULSEBOARD_VALIDATE_SECS"));
        assert!(err.to_string().contains("soon"));
    }
}
