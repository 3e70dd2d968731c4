//! The dashboard facade: one session manager, one validator, one
//! metrics client, wired together.

use std::sync::Arc;

use pulseboard_query::{MetricsClient, QueryAggregator, Section};
use pulseboard_session::{
    CredentialService, FileStore, GateDecision, GateInput, HttpCredentialService, KeyValueStore,
    LoginRequest, SessionManager, SessionSnapshot, evaluate,
};
use pulseboard_transport::ApiClient;
use pulseboard_validator::{Navigator, SessionControl, TokenValidator};
use serde_json::Value;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info};

use crate::{DashboardConfig, PulseboardError};

/// A [`SessionManager`] shared between the dashboard and the validator.
///
/// The validator reaches the session only through this handle's
/// [`SessionControl`] impl, which reads the persisted credential and
/// terminates by calling `logout()`.
pub struct SharedSession<C: CredentialService, S: KeyValueStore>(
    Arc<Mutex<SessionManager<C, S>>>,
);

impl<C: CredentialService, S: KeyValueStore> SharedSession<C, S> {
    pub fn new(manager: SessionManager<C, S>) -> Self {
        Self(Arc::new(Mutex::new(manager)))
    }

    /// Locks the manager for direct access.
    pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, SessionManager<C, S>> {
        self.0.lock().await
    }
}

impl<C: CredentialService, S: KeyValueStore> Clone for SharedSession<C, S> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<C: CredentialService, S: KeyValueStore> SessionControl for SharedSession<C, S> {
    async fn credential(&self) -> Option<String> {
        self.0.lock().await.credential()
    }

    async fn terminate(&self) {
        self.0.lock().await.logout();
    }
}

/// The client-side core of the dashboard.
///
/// Owns the session manager (behind a mutex, shared with the validator),
/// keeps the validator running exactly while a session exists, answers
/// the gate question for protected views, and builds section
/// aggregators.
///
/// Session state is read from the manager's `watch` channel, so
/// [`gate`](Self::gate) never waits, even while a login is in flight.
pub struct Dashboard<C: CredentialService, S: KeyValueStore, N: Navigator> {
    session: SharedSession<C, S>,
    snapshots: watch::Receiver<SessionSnapshot>,
    validator: TokenValidator<SharedSession<C, S>, N>,
    metrics: MetricsClient,
}

impl<N: Navigator> Dashboard<HttpCredentialService, FileStore, N> {
    /// Builds a dashboard talking HTTP to `config.api` and persisting to
    /// `config.store_path`.
    ///
    /// # Errors
    /// [`PulseboardError::Api`] for an unusable base URL,
    /// [`PulseboardError::Store`] if the store file cannot be read.
    pub fn connect(config: DashboardConfig, navigator: N) -> Result<Self, PulseboardError> {
        let config = config.validated();
        let api = ApiClient::new(config.api.clone())?;
        let store = FileStore::open(&config.store_path)?;
        info!(
            base_url = api.base_url(),
            store = %config.store_path.display(),
            "dashboard connected"
        );
        Ok(Self::new(
            HttpCredentialService::new(api.clone()),
            store,
            MetricsClient::new(api),
            navigator,
            &config,
        ))
    }
}

impl<C: CredentialService, S: KeyValueStore, N: Navigator> Dashboard<C, S, N> {
    /// Wires the given parts together. The session starts uninitialized;
    /// call [`initialize`](Self::initialize) next.
    pub fn new(
        service: C,
        backend: S,
        metrics: MetricsClient,
        navigator: N,
        config: &DashboardConfig,
    ) -> Self {
        let manager = SessionManager::new(service, backend, config.session.clone());
        let snapshots = manager.subscribe();
        let session = SharedSession::new(manager);
        let validator = TokenValidator::new(session.clone(), navigator, config.validator.clone());
        Self {
            session,
            snapshots,
            validator,
            metrics,
        }
    }

    /// Restores a persisted session, if any, and starts validating it.
    pub async fn initialize(&mut self) {
        self.session.lock().await.initialize();
        self.sync_validator();
    }

    /// Logs in and starts validating the new session.
    ///
    /// # Errors
    /// [`PulseboardError::Session`]; the same user-facing message is also
    /// visible in [`snapshot`](Self::snapshot)`.error`.
    pub async fn login(&mut self, request: &LoginRequest) -> Result<(), PulseboardError> {
        let result = self.session.lock().await.login(request).await;
        self.sync_validator();
        Ok(result?)
    }

    /// Ends the session and stops validating.
    pub async fn logout(&mut self) {
        self.session.lock().await.logout();
        self.sync_validator();
    }

    /// Asks the credential service for a password-reset email.
    ///
    /// # Errors
    /// [`PulseboardError::Session`] if the service rejected the request
    /// or could not be reached.
    pub async fn request_password_reset(&self, email: &str) -> Result<String, PulseboardError> {
        Ok(self.session.lock().await.request_password_reset(email).await?)
    }

    /// Clears the recorded error message.
    pub async fn clear_error(&self) {
        self.session.lock().await.clear_error();
    }

    /// What a protected view should render right now.
    pub fn gate(&self) -> GateDecision {
        let snapshot = self.snapshots.borrow();
        evaluate(GateInput::from_snapshot(&snapshot))
    }

    /// The latest published session state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver notified on every session change, including forced
    /// termination by the validator.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// An aggregator over `section`'s metrics. Call `fetch` on it to load.
    pub fn section(&self, section: Section) -> QueryAggregator<u32, Value> {
        debug!(%section, "building section aggregator");
        section.aggregator(&self.metrics)
    }

    pub fn session(&self) -> &SharedSession<C, S> {
        &self.session
    }

    pub fn validator(&self) -> &TokenValidator<SharedSession<C, S>, N> {
        &self.validator
    }

    pub fn metrics(&self) -> &MetricsClient {
        &self.metrics
    }

    /// The validator runs exactly while a session exists.
    fn sync_validator(&mut self) {
        let authenticated = self.snapshots.borrow().is_authenticated();
        self.validator.set_enabled(authenticated);
    }
}
