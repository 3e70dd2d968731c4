//! # Pulseboard
//!
//! Client-side core of an operations and finance metrics dashboard.
//!
//! Pulseboard owns the parts of a dashboard that are not drawing:
//! who is logged in, whether their credential is still good, whether the
//! current view may be shown at all, and how the several metrics on a
//! page are fetched and combined. Rendering stays with the caller, which
//! gets a [`GateDecision`] and an [`AggregateResult`] to draw from.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pulseboard::prelude::*;
//! # struct Browser;
//! # impl Navigator for Browser {
//! #     fn current_path(&self) -> String { "/".into() }
//! #     fn navigate(&self, _: &str) {}
//! # }
//!
//! # async fn run() -> Result<(), PulseboardError> {
//! pulseboard::init_tracing();
//! let mut dashboard = Dashboard::connect(DashboardConfig::from_env()?, Browser)?;
//! dashboard.initialize().await;
//! dashboard.login(&LoginRequest::new("ops@example.com", "secret")).await?;
//!
//! if dashboard.gate().allows_render() {
//!     let mut overview = dashboard.section(Section::Overview);
//!     overview.fetch(None);
//!     let view = overview.settled().await;
//!     # let _ = view;
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod dashboard;
mod error;
mod logging;

pub use config::DashboardConfig;
pub use dashboard::{Dashboard, SharedSession};
pub use error::{ConfigError, PulseboardError};
pub use logging::{init_tracing, init_tracing_with};

pub use pulseboard_query::{
    AggregateResult, MetricsClient, QueryAggregator, QueryError, QuerySourceResult, Section,
};
pub use pulseboard_session::{
    FileStore, GateDecision, GateInput, HttpCredentialService, KeyValueStore, LoginRequest,
    MemoryStore, SessionConfig, SessionError, SessionManager, SessionSnapshot, SessionState,
    StoreError, User, evaluate,
};
pub use pulseboard_token::{TokenCodec, TokenError};
pub use pulseboard_transport::{ApiClient, ApiConfig, ApiError, ApiErrorKind};
pub use pulseboard_validator::{Navigator, TokenValidator, ValidationOutcome, ValidatorConfig};

/// Everything a dashboard front end typically needs.
pub mod prelude {
    pub use crate::{
        AggregateResult, ApiConfig, Dashboard, DashboardConfig, GateDecision, LoginRequest,
        Navigator, PulseboardError, QuerySourceResult, Section, SessionSnapshot, SessionState,
        User,
    };
}
