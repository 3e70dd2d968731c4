//! Validator configuration.

use std::time::Duration;

use tracing::warn;

/// How often to re-validate and where to send the user afterwards.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Time between validation passes. The first pass runs immediately
    /// on enable.
    ///
    /// Default: 5 minutes.
    pub interval: Duration,

    /// The login entry point to redirect to after forced termination.
    ///
    /// Default: `/login`.
    pub login_path: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5 * 60),
            login_path: "/login".to_string(),
        }
    }
}

impl ValidatorConfig {
    /// Shortest interval accepted; anything smaller is clamped up.
    pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

    /// Config with the given interval and default login path.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values so the config is safe to run.
    ///
    /// Called by [`TokenValidator::new`](crate::TokenValidator::new).
    /// - `interval` raised to at least [`Self::MIN_INTERVAL`]
    /// - an empty `login_path` becomes `/login`
    pub fn validated(mut self) -> Self {
        if self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_ms = self.interval.as_millis() as u64,
                min_ms = Self::MIN_INTERVAL.as_millis() as u64,
                "validation interval below minimum, clamping"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        if self.login_path.trim().is_empty() {
            self.login_path = "/login".to_string();
        }
        self
    }
}
