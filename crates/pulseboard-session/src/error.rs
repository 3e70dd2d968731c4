//! Error types for the session layer.

use pulseboard_transport::{ApiError, UNEXPECTED_ERROR_MESSAGE};

/// Errors from the durable key-value store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be (de)serialized.
    #[error("store serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors returned by [`SessionManager`](crate::SessionManager) operations.
///
/// Every variant also has a user-facing message
/// ([`user_message`](Self::user_message)) which the manager records in
/// its `error` field before handing the error back to the caller.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The service answered but reported `success: false`.
    #[error("rejected by credential service: {0}")]
    Rejected(String),

    /// The service said `success: true` but left out the session data.
    #[error("credential service response is missing session data")]
    InvalidResponse,

    /// The call itself failed (no response, error status, ...).
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The session could not be persisted.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionError {
    /// The message to surface in the UI.
    ///
    /// Service-provided message first, then the transport message, then
    /// the generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(message) if !message.is_empty() => message.clone(),
            Self::Api(e) => e.message.clone(),
            Self::Rejected(_) | Self::InvalidResponse | Self::Store(_) => {
                UNEXPECTED_ERROR_MESSAGE.to_string()
            }
        }
    }

    /// HTTP status behind the failure, 0 when there is none.
    pub fn status(&self) -> u16 {
        match self {
            Self::Api(e) => e.status,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_service_message() {
        let err = SessionError::Rejected("Usuario bloqueado".into());
        assert_eq!(err.user_message(), "Usuario bloqueado");
    }

    #[test]
    fn test_user_message_empty_rejection_falls_back() {
        let err = SessionError::Rejected(String::new());
        assert_eq!(err.user_message(), UNEXPECTED_ERROR_MESSAGE);
    }

    #[test]
    fn test_user_message_passes_api_message_and_status() {
        let err: SessionError = ApiError::service(401, "Credenciales inválidas").into();
        assert_eq!(err.user_message(), "Credenciales inválidas");
        assert_eq!(err.status(), 401);
    }

    #[test]
    fn test_user_message_transport_is_connection_message() {
        let err: SessionError = ApiError::transport().into();
        assert_eq!(err.user_message(), pulseboard_transport::CONNECTION_ERROR_MESSAGE);
        assert_eq!(err.status(), 0);
    }
}
