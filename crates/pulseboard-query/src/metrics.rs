//! HTTP metrics endpoints.

use pulseboard_transport::ApiClient;
use serde_json::Value;
use tracing::debug;

use crate::QueryError;

/// Path prefix of the metrics endpoints, relative to the API base URL.
pub const METRICS_PATH: &str = "/metrics";

/// Fetches named metrics as opaque JSON.
///
/// Each metric lives at `GET /metrics/<name>?days=N[&limit=K]`. The
/// response body is returned untouched; its shape is between the
/// metrics service and whatever renders it.
#[derive(Debug, Clone)]
pub struct MetricsClient {
    api: ApiClient,
}

impl MetricsClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Fetches `name` over the last `days` days, optionally capped to
    /// `limit` rows.
    ///
    /// # Errors
    /// [`QueryError::Api`] for any failed call, with the transport's
    /// uniform message and status.
    pub async fn fetch(
        &self,
        name: &str,
        days: u32,
        limit: Option<u32>,
    ) -> Result<Value, QueryError> {
        let mut query = vec![("days", days.to_string())];
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }

        let path = format!("{METRICS_PATH}/{name}");
        debug!(metric = name, days, ?limit, "fetching metric");
        Ok(self.api.get_json(&path, &query).await?)
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}
