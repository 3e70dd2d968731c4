//! The decoded payload of a credential.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Claims read from a credential's payload segment.
///
/// Only `exp` drives behavior. `sub` is kept for log context and any
/// other fields are preserved in `extra` so nothing is silently lost
/// when a caller wants to inspect them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Expiry, in seconds since the Unix epoch. A JSON numeric date, so
    /// fractional values are allowed. `None` when the service issued a
    /// token without an expiry.
    #[serde(default)]
    pub exp: Option<f64>,

    /// Subject the token was issued to.
    #[serde(default)]
    pub sub: Option<String>,

    /// Every other claim, untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Claims {
    /// The expiry as a wall-clock time, if the token has one that the
    /// platform clock can represent.
    pub fn expires_at(&self) -> Option<SystemTime> {
        let exp = self.exp?;
        let secs = Duration::try_from_secs_f64(exp.max(0.0)).unwrap_or(Duration::MAX);
        UNIX_EPOCH.checked_add(secs)
    }

    /// Whether the claims are expired at `now_millis` (milliseconds since
    /// the epoch). Claims without `exp` never expire.
    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        match self.exp {
            Some(exp) => exp * 1000.0 < now_millis as f64,
            None => false,
        }
    }
}
