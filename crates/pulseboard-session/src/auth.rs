//! The credential service boundary.
//!
//! Pulseboard doesn't authenticate anyone itself. It sends an email and
//! password to a remote credential service and gets back a token plus a
//! user record in the service's own shape. The [`CredentialService`]
//! trait is that boundary: the HTTP implementation is
//! [`HttpCredentialService`], and tests plug in scripted fakes.

use std::fmt;
use std::future::Future;

use pulseboard_transport::{ApiClient, ApiError};
use serde::{Deserialize, Serialize};

use crate::RemoteUser;

/// Email/password pair submitted at login.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

// Keep the password out of logs.
impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The `{success, message}` envelope every credential endpoint returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// Session data carried by a successful login response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user: RemoteUser,
    pub token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<String>,
}

/// Response of `POST /login`.
///
/// `success` can be `false` even when the HTTP status is 2xx; the
/// session manager treats that as a failed login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<LoginData>,
}

/// Exchanges credentials with the remote credential service.
///
/// # Trait bounds
///
/// `Send + Sync + 'static` so the service can live inside the session
/// manager for the lifetime of the client, shared across tasks.
///
/// Implementors can write `async fn`; the trait spells out the `Send`
/// bound on the returned futures so callers can spawn them.
pub trait CredentialService: Send + Sync + 'static {
    /// Submits `request` and returns the raw service response.
    ///
    /// # Errors
    /// Any [`ApiError`]: no response, an error status, or an
    /// undecodable body.
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<LoginResponse, ApiError>> + Send;

    /// Asks the service to email a password-reset link to `email`.
    ///
    /// # Errors
    /// Same categories as [`login`](Self::login).
    fn request_password_reset(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<ServiceEnvelope, ApiError>> + Send;
}

/// [`CredentialService`] over HTTP.
///
/// - `POST {base}/login` with `{email, password}`
/// - `POST {base}/forgot-password` with `{email}`
#[derive(Debug, Clone)]
pub struct HttpCredentialService {
    client: ApiClient,
}

impl HttpCredentialService {
    pub const LOGIN_PATH: &'static str = "/login";
    pub const PASSWORD_RESET_PATH: &'static str = "/forgot-password";

    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

impl CredentialService for HttpCredentialService {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.client.post_json(Self::LOGIN_PATH, request).await
    }

    async fn request_password_reset(&self, email: &str) -> Result<ServiceEnvelope, ApiError> {
        #[derive(Serialize)]
        struct ResetRequest<'a> {
            email: &'a str,
        }

        self.client
            .post_json(Self::PASSWORD_RESET_PATH, &ResetRequest { email })
            .await
    }
}
