//! The uniform error shape for remote calls.

use serde::Deserialize;

/// Shown when the request never got a response.
pub const CONNECTION_ERROR_MESSAGE: &str =
    "Error de conexión. Verifica tu conexión a internet.";

/// Shown when the failure does not fit any other category.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "Ha ocurrido un error inesperado";

/// Which of the three failure categories an [`ApiError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// No response was received.
    Transport,
    /// The service answered with an error status.
    Service,
    /// Anything else (bad URL, undecodable body, ...).
    Unexpected,
}

/// A failed remote call.
///
/// The shape is the same regardless of cause so the UI can always show
/// `message` and branch on `status` without knowing what broke.
/// `Clone` so it can be stored in view-model snapshots.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (status {status})")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// HTTP status, or 0 when there was no usable response.
    pub status: u16,
    pub message: String,
}

impl ApiError {
    pub fn transport() -> Self {
        Self {
            kind: ApiErrorKind::Transport,
            status: 0,
            message: CONNECTION_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn service(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Service,
            status,
            message: message.into(),
        }
    }

    pub fn unexpected() -> Self {
        Self {
            kind: ApiErrorKind::Unexpected,
            status: 0,
            message: UNEXPECTED_ERROR_MESSAGE.to_string(),
        }
    }

    /// Builds a `Service` error from an error response body.
    ///
    /// Uses the body's `message` field when there is one, falling back to
    /// the generic message while still keeping the real status.
    pub(crate) fn from_error_body(status: u16, body: &[u8]) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            message: Option<String>,
        }

        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| UNEXPECTED_ERROR_MESSAGE.to_string());
        Self::service(status, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_has_status_zero_and_fixed_message() {
        let err = ApiError::transport();
        assert_eq!(err.kind, ApiErrorKind::Transport);
        assert_eq!(err.status, 0);
        assert_eq!(err.message, CONNECTION_ERROR_MESSAGE);
    }

    #[test]
    fn test_unexpected_has_status_zero() {
        let err = ApiError::unexpected();
        assert_eq!(err.status, 0);
        assert_eq!(err.message, UNEXPECTED_ERROR_MESSAGE);
    }

    #[test]
    fn test_from_error_body_uses_service_message() {
        let err = ApiError::from_error_body(
            401,
            r#"{"success":false,"message":"Credenciales inválidas"}"#.as_bytes(),
        );
        assert_eq!(err.kind, ApiErrorKind::Service);
        assert_eq!(err.status, 401);
        assert_eq!(err.message, "Credenciales inválidas");
    }

    #[test]
    fn test_from_error_body_without_message_falls_back() {
        let err = ApiError::from_error_body(502, b"<html>bad gateway</html>");
        assert_eq!(err.status, 502);
        assert_eq!(err.message, UNEXPECTED_ERROR_MESSAGE);
    }

    #[test]
    fn test_display_includes_message_and_status() {
        let err = ApiError::service(404, "not here");
        assert_eq!(err.to_string(), "not here (status 404)");
    }
}
