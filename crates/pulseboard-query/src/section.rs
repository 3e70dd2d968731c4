//! The built-in dashboard sections.
//!
//! Each section is a fixed set of metrics fetched together over one
//! time window. Sections differ in their default window: the overview
//! looks at the last week, finance at the last month, operations at the
//! last two weeks.

use std::fmt;

use serde_json::Value;

use crate::{MetricsClient, QueryAggregator};

/// Row cap for the finance section's top-routes ranking.
pub const TOP_ROUTES_LIMIT: u32 = 10;

/// A dashboard section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Conversion funnel, fare summary, recent events.
    Overview,
    /// Revenue, payouts, top routes.
    Finance,
    /// Trips, drivers, incidents.
    Operations,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Overview, Section::Finance, Section::Operations];

    pub fn name(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Finance => "finance",
            Self::Operations => "operations",
        }
    }

    /// Days covered when the caller does not pick a window.
    pub fn default_days(self) -> u32 {
        match self {
            Self::Overview => 7,
            Self::Finance => 30,
            Self::Operations => 14,
        }
    }

    /// Metric names fetched for this section, in display order.
    pub fn sources(self) -> &'static [&'static str] {
        match self {
            Self::Overview => &["funnel", "fares", "events"],
            Self::Finance => &["revenue", "payouts", "top_routes"],
            Self::Operations => &["trips", "drivers", "incidents"],
        }
    }

    /// Row cap applied to a source, if any.
    pub fn limit_for(self, source: &str) -> Option<u32> {
        match (self, source) {
            (Self::Finance, "top_routes") => Some(TOP_ROUTES_LIMIT),
            _ => None,
        }
    }

    /// An aggregator over this section's metrics, parameterized by the
    /// number of days, defaulting to [`default_days`](Self::default_days).
    pub fn aggregator(self, client: &MetricsClient) -> QueryAggregator<u32, Value> {
        self.sources()
            .iter()
            .fold(QueryAggregator::new(self.default_days()), |agg, &name| {
                let client = client.clone();
                let limit = self.limit_for(name);
                agg.with_source(name, move |days| {
                    let client = client.clone();
                    async move { client.fetch(name, days, limit).await }
                })
            })
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
