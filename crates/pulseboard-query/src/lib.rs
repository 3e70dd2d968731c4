//! Query aggregation for Pulseboard dashboard sections.
//!
//! A dashboard section shows several metrics side by side, each fetched
//! from its own endpoint. Those fetches complete in any order and fail
//! independently; [`QueryAggregator`] folds them into one
//! [`AggregateResult`] the presentation layer can render at any moment.
//!
//! # Key types
//!
//! - [`QueryAggregator`]: fan-out/fan-in over named async sources
//! - [`AggregateResult`] / [`QuerySourceResult`]: the view model
//! - [`Section`]: the built-in dashboard sections and their defaults
//! - [`MetricsClient`]: the HTTP metrics endpoints

mod aggregator;
mod error;
mod metrics;
mod result;
mod section;

pub use aggregator::{QueryAggregator, SourceFuture};
pub use error::QueryError;
pub use metrics::{METRICS_PATH, MetricsClient};
pub use result::{AggregateResult, QuerySourceResult};
pub use section::{Section, TOP_ROUTES_LIMIT};
