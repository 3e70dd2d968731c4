//! The session manager: the single owner of "who is logged in".
//!
//! Everything that changes the session goes through here:
//! - `initialize()` restores a persisted session at startup
//! - `login()` exchanges credentials for a session
//! - `logout()` ends it (also used for forced termination)
//!
//! Other components never write session fields. They read published
//! [`SessionSnapshot`]s through [`subscribe`](SessionManager::subscribe)
//! and ask for termination by calling `logout()`.
//!
//! # Concurrency note
//!
//! `SessionManager` takes `&mut self` for every mutation and is not
//! shared directly. The dashboard owns it behind a mutex; observers that
//! must not wait on that mutex (e.g. the access gate during a slow login)
//! read the `watch` channel instead.

use pulseboard_token::TokenCodec;
use tokio::sync::watch;

use crate::{
    CredentialService, KeyValueStore, LoginRequest, Session, SessionConfig,
    SessionError, SessionSnapshot, SessionState, SessionStore, User,
};

/// Owns the session, its persisted copy, and the last error.
///
/// ## Lifecycle
///
/// ```text
/// new() ──→ initialize() ──→ login() ──→ logout()
///  │             │              │            │
///  ▼             ▼              ▼            ▼
/// [Uninitialized] [Initializing] [Authenticating] [Unauthenticated]
///                    │              │
///                    ▼              ▼
///       [Authenticated | Unauthenticated]
/// ```
pub struct SessionManager<C: CredentialService, S: KeyValueStore> {
    service: C,
    store: SessionStore<S>,
    codec: TokenCodec,
    session: Session,
    state: SessionState,
    /// Last user-facing error message, cleared on the next login attempt.
    error: Option<String>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl<C: CredentialService, S: KeyValueStore> SessionManager<C, S> {
    /// Creates an uninitialized manager. Call [`initialize`](Self::initialize)
    /// before relying on its state.
    pub fn new(service: C, backend: S, config: SessionConfig) -> Self {
        let (snapshots, _) = watch::channel(SessionSnapshot::default());
        Self {
            service,
            store: SessionStore::new(backend, config),
            codec: TokenCodec,
            session: Session::default(),
            state: SessionState::Uninitialized,
            error: None,
            snapshots,
        }
    }

    /// Restores the persisted session, if there is a usable one.
    ///
    /// A stored credential that is expired or unreadable, a user record
    /// that does not parse, or only one of the two keys being present all
    /// end the same way: session and storage cleared, the reason logged,
    /// and the manager left `Unauthenticated`. This never fails and never
    /// leaves the manager loading.
    pub fn initialize(&mut self) {
        self.transition(SessionState::Initializing);

        match self.store.load() {
            Some(persisted) if !self.codec.is_expired(&persisted.credential) => {
                tracing::info!(user_id = %persisted.user.id, "session restored");
                self.session.user = Some(persisted.user);
            }
            Some(persisted) => {
                tracing::info!(user_id = %persisted.user.id, "persisted credential expired, discarding");
                self.discard_session();
            }
            None => self.discard_session(),
        }

        self.transition(self.settled_state());
    }

    /// Logs in with `request`.
    ///
    /// On success the session holds the canonical user and both storage
    /// keys are written. On failure the error message is recorded (see
    /// [`SessionError::user_message`]), the session is left
    /// unauthenticated, and the error is also returned so the caller can
    /// branch on it. The manager is never left loading.
    ///
    /// # Errors
    /// - [`SessionError::Api`] — no response or an error status
    /// - [`SessionError::Rejected`] — the service answered `success: false`
    /// - [`SessionError::InvalidResponse`] — `success: true` without data
    /// - [`SessionError::Store`] — the session could not be persisted
    ///
    /// Dropping the returned future before it completes (a timeout, a
    /// `select!` branch, an aborted task) also settles the state: the
    /// session is left as it was before the call and no longer loading.
    pub async fn login(&mut self, request: &LoginRequest) -> Result<(), SessionError> {
        self.error = None;
        self.transition(SessionState::Authenticating);

        let guard = SettleOnDrop(self);
        let result = guard.0.authenticate(request).await;

        if let Err(e) = &result {
            tracing::warn!(email = %request.email, status = e.status(), error = %e, "login failed");
            guard.0.discard_session();
            guard.0.error = Some(e.user_message());
        }

        let settled = guard.0.settled_state();
        guard.0.transition(settled);
        result
    }

    async fn authenticate(&mut self, request: &LoginRequest) -> Result<(), SessionError> {
        let response = self.service.login(request).await?;
        if !response.success {
            return Err(SessionError::Rejected(response.message));
        }

        let data = response
            .data
            .filter(|d| !d.token.is_empty())
            .ok_or(SessionError::InvalidResponse)?;
        let user = data.user.into_user();

        self.store.save(&data.token, &user)?;
        tracing::info!(user_id = %user.id, role = %user.role, "login succeeded");
        self.session.user = Some(user);
        Ok(())
    }

    /// Ends the session: clears the user, both storage keys, and the error.
    ///
    /// Idempotent and infallible; safe to call when nobody is logged in.
    pub fn logout(&mut self) {
        if let Some(user) = &self.session.user {
            tracing::info!(user_id = %user.id, "logged out");
        }
        self.discard_session();
        self.error = None;
        self.transition(self.settled_state());
    }

    /// Clears the recorded error and nothing else.
    pub fn clear_error(&mut self) {
        if self.error.take().is_some() {
            self.publish();
        }
    }

    /// Asks the credential service to send a password-reset email.
    ///
    /// Does not touch the session. Failures are recorded in the error
    /// field the same way login failures are.
    ///
    /// # Errors
    /// [`SessionError::Api`] or [`SessionError::Rejected`].
    pub async fn request_password_reset(&mut self, email: &str) -> Result<String, SessionError> {
        self.error = None;
        self.publish();

        let result = match self.service.request_password_reset(email).await {
            Ok(envelope) if envelope.success => Ok(envelope.message),
            Ok(envelope) => Err(SessionError::Rejected(envelope.message)),
            Err(e) => Err(e.into()),
        };

        if let Err(e) = &result {
            tracing::warn!(%email, error = %e, "password reset request failed");
            self.error = Some(e.user_message());
            self.publish();
        }
        result
    }

    // -- Accessors ---------------------------------------------------------

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn user(&self) -> Option<&User> {
        self.session.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// `true` while initializing or while a login call is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(
            self.state,
            SessionState::Initializing | SessionState::Authenticating
        )
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The persisted credential, read fresh from storage.
    pub fn credential(&self) -> Option<String> {
        self.store.credential()
    }

    /// The underlying session store.
    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    /// A copy of the current observable state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            user: self.session.user.clone(),
            is_loading: self.is_loading(),
            error: self.error.clone(),
        }
    }

    /// Receives a new snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    // -- Internals ---------------------------------------------------------

    fn settled_state(&self) -> SessionState {
        if self.session.is_authenticated() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }

    fn discard_session(&mut self) {
        self.session.user = None;
        self.store.clear();
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            tracing::debug!(from = %self.state, to = %next, "session state");
        }
        self.state = next;
        self.publish();
    }

    fn publish(&self) {
        // `send_replace` succeeds even when nobody is subscribed.
        self.snapshots.send_replace(self.snapshot());
    }
}

/// Settles a login that never reached its own settling step.
struct SettleOnDrop<'a, C: CredentialService, S: KeyValueStore>(&'a mut SessionManager<C, S>);

impl<C: CredentialService, S: KeyValueStore> Drop for SettleOnDrop<'_, C, S> {
    fn drop(&mut self) {
        if self.0.state == SessionState::Authenticating {
            tracing::debug!("login cancelled before completing");
            let settled = self.0.settled_state();
            self.0.transition(settled);
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
