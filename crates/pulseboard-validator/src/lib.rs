//! Background credential re-validation for Pulseboard.
//!
//! While a session exists, the client periodically re-checks the
//! credential it holds. If the credential is gone or expired, the
//! session is terminated (exactly like a logout) and the client is sent
//! to the login page.
//!
//! - [`ValidationSchedule`] — when passes happen (immediately, then every
//!   `interval`)
//! - [`TokenValidator`] — owns the background task; `enable` / `disable`
//!   is its whole control surface
//! - [`SessionControl`] / [`Navigator`] — what the validator needs from
//!   the rest of the client
//!
//! # Integration
//!
//! ```ignore
//! let mut validator = TokenValidator::new(host, navigator, ValidatorConfig::default());
//! // Whenever session state changes:
//! validator.set_enabled(snapshot.is_authenticated());
//! ```

mod config;
mod schedule;
mod validator;

pub use config::ValidatorConfig;
pub use schedule::{ScheduledPass, ValidationSchedule};
pub use validator::{Navigator, SessionControl, TokenValidator, ValidationOutcome};
