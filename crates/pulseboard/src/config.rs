//! Top-level configuration.

use std::path::PathBuf;
use std::time::Duration;

use pulseboard_session::SessionConfig;
use pulseboard_transport::ApiConfig;
use pulseboard_validator::ValidatorConfig;
use tracing::debug;

use crate::ConfigError;

/// Everything needed to wire up a [`Dashboard`](crate::Dashboard).
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Where the credential and metrics services live.
    pub api: ApiConfig,

    /// Storage keys for the persisted session.
    pub session: SessionConfig,

    /// Re-validation interval and login path.
    pub validator: ValidatorConfig,

    /// File backing the durable session store.
    ///
    /// Default: `pulseboard-session.json` in the working directory.
    pub store_path: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            session: SessionConfig::default(),
            validator: ValidatorConfig::default(),
            store_path: PathBuf::from("pulseboard-session.json"),
        }
    }
}

impl DashboardConfig {
    /// Base URL of the remote services.
    pub const API_URL_VAR: &'static str = "PULSEBOARD_API_URL";
    /// Re-validation interval, in whole seconds.
    pub const VALIDATE_SECS_VAR: &'static str = "PULSEBOARD_VALIDATE_SECS";
    /// Path of the session store file.
    pub const STORE_PATH_VAR: &'static str = "PULSEBOARD_STORE_PATH";

    /// Defaults overridden by whichever `PULSEBOARD_*` variables are set.
    ///
    /// # Errors
    /// [`ConfigError::InvalidNumber`] if `PULSEBOARD_VALIDATE_SECS` is set
    /// but not a whole number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through
    /// `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(url) = get(Self::API_URL_VAR) {
            config.api.base_url = url;
        }
        if let Some(raw) = get(Self::VALIDATE_SECS_VAR) {
            let secs = raw.parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
                var: Self::VALIDATE_SECS_VAR,
                value: raw.clone(),
            })?;
            config.validator.interval = Duration::from_secs(secs);
        }
        if let Some(path) = get(Self::STORE_PATH_VAR) {
            config.store_path = PathBuf::from(path);
        }

        debug!(
            base_url = %config.api.base_url,
            validate_secs = config.validator.interval.as_secs(),
            store_path = %config.store_path.display(),
            "dashboard configuration loaded"
        );
        Ok(config)
    }

    /// Clamps out-of-range values in the nested configs.
    pub fn validated(mut self) -> Self {
        self.validator = self.validator.validated();
        self
    }
}
