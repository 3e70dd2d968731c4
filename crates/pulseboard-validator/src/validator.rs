//! The token validator: a background task that ends dead sessions.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use pulseboard_token::TokenCodec;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::{ValidationSchedule, ValidatorConfig};

/// What the validator needs from the session owner.
///
/// The validator never touches session state itself: it reads the held
/// credential and, when that credential is unusable, asks the owner to
/// terminate the session (which must behave exactly like a logout).
pub trait SessionControl: Send + Sync + 'static {
    /// The currently persisted credential, if any.
    fn credential(&self) -> impl Future<Output = Option<String>> + Send;

    /// Ends the session: clears the user, storage, and error.
    fn terminate(&self) -> impl Future<Output = ()> + Send;
}

/// Client-side navigation. The validator only requests a redirect; how
/// it happens is up to the presentation layer.
pub trait Navigator: Send + Sync + 'static {
    /// The path currently shown.
    fn current_path(&self) -> String;

    /// Navigates to `path`.
    fn navigate(&self, path: &str);
}

/// Result of one validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The credential is present and not expired.
    Valid,
    /// The session was terminated. `redirected` is `false` when the
    /// client was already on the login path.
    Terminated { redirected: bool },
}

/// State shared between the validator handle and its background task.
struct Shared<H, N> {
    host: H,
    navigator: N,
    login_path: String,
    codec: TokenCodec,
    passes: AtomicU64,
}

impl<H: SessionControl, N: Navigator> Shared<H, N> {
    async fn run_pass(&self) -> ValidationOutcome {
        let pass = self.passes.fetch_add(1, Ordering::Relaxed) + 1;

        let valid = match self.host.credential().await {
            Some(credential) => !self.codec.is_expired(&credential),
            None => {
                debug!(pass, "no credential held");
                false
            }
        };
        if valid {
            trace!(pass, "credential still valid");
            return ValidationOutcome::Valid;
        }

        warn!(pass, "credential missing or expired, terminating session");
        self.host.terminate().await;

        let redirected = self.navigator.current_path() != self.login_path;
        if redirected {
            self.navigator.navigate(&self.login_path);
        }
        ValidationOutcome::Terminated { redirected }
    }
}

/// Periodically re-validates the held credential while enabled.
///
/// Enabling spawns one Tokio task that validates immediately and then
/// every `interval`. The task stops on its own after terminating a
/// session, and is aborted by [`disable`](Self::disable) or when the
/// validator is dropped, so it never outlives its owner.
pub struct TokenValidator<H: SessionControl, N: Navigator> {
    shared: Arc<Shared<H, N>>,
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl<H: SessionControl, N: Navigator> TokenValidator<H, N> {
    /// Creates a disabled validator.
    pub fn new(host: H, navigator: N, config: ValidatorConfig) -> Self {
        let config = config.validated();
        Self {
            shared: Arc::new(Shared {
                host,
                navigator,
                login_path: config.login_path,
                codec: TokenCodec,
                passes: AtomicU64::new(0),
            }),
            interval: config.interval,
            task: None,
        }
    }

    /// Starts the background task. No-op if it is already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn enable(&mut self) {
        if self.is_enabled() {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let interval = self.interval;
        self.task = Some(tokio::spawn(async move {
            let mut schedule = ValidationSchedule::new(interval);
            loop {
                let due = schedule.wait_for_pass().await;
                if due.late {
                    debug!(pass = due.pass, "validation pass ran late");
                }
                if let ValidationOutcome::Terminated { .. } = shared.run_pass().await {
                    debug!("session terminated, validation task exiting");
                    break;
                }
            }
        }));

        info!(interval_secs = interval.as_secs(), "token validation enabled");
    }

    /// Cancels the background task, if running.
    pub fn disable(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("token validation disabled");
        }
    }

    /// Enables or disables; the one switch the owner flips when a session
    /// appears or disappears.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled {
            self.enable();
        } else {
            self.disable();
        }
    }

    /// Whether the background task is currently running.
    pub fn is_enabled(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Runs a single pass right now, outside the schedule.
    pub async fn validate_once(&self) -> ValidationOutcome {
        self.shared.run_pass().await
    }

    /// Passes run so far, scheduled or manual.
    pub fn pass_count(&self) -> u64 {
        self.shared.passes.load(Ordering::Relaxed)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<H: SessionControl, N: Navigator> Drop for TokenValidator<H, N> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
