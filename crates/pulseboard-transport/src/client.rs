//! A thin JSON-over-HTTP client with uniform error mapping.

use std::time::Duration;

use reqwest::{Response, Url};
use serde::{Serialize, de::DeserializeOwned};

use crate::ApiError;

/// Where the remote services live and how long to wait for them.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every request path is appended to, e.g.
    /// `https://api.example.com/api`.
    pub base_url: String,

    /// Per-request timeout. A timeout counts as "no response".
    ///
    /// Default: 30 seconds.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000/api".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Shared HTTP client for the credential and metrics services.
///
/// Cheap to clone: `reqwest::Client` is reference-counted internally.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Builds a client from `config`.
    ///
    /// # Errors
    /// Returns [`ApiError::unexpected`] if the base URL does not parse or
    /// the underlying HTTP client cannot be constructed.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        Url::parse(&config.base_url).map_err(|e| {
            tracing::error!(base_url = %config.base_url, error = %e, "invalid API base URL");
            ApiError::unexpected()
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "failed to build HTTP client");
                ApiError::unexpected()
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The base URL requests are resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolves `path` against the base URL and appends `query`.
    pub fn url(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Url, ApiError> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut url = Url::parse(&raw).map_err(|e| {
            tracing::error!(url = %raw, error = %e, "invalid request URL");
            ApiError::unexpected()
        })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// `GET path?query` and decode the JSON body as `T`.
    ///
    /// # Errors
    /// See the crate-level table for how failures are categorized.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path, query)?;
        tracing::debug!(%url, "GET");
        let response = self.http.get(url).send().await.map_err(send_error)?;
        decode(response).await
    }

    /// `POST path` with a JSON body and decode the JSON response as `T`.
    ///
    /// # Errors
    /// See the crate-level table for how failures are categorized.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path, &[])?;
        tracing::debug!(%url, "POST");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(send_error)?;
        decode(response).await
    }
}

/// Classifies an error from `send()`.
///
/// A builder error means the request never left (our bug, not the
/// network's); everything else means no response arrived.
fn send_error(e: reqwest::Error) -> ApiError {
    if e.is_builder() {
        tracing::error!(error = %e, "failed to build request");
        ApiError::unexpected()
    } else {
        tracing::warn!(error = %e, "no response from service");
        ApiError::transport()
    }
}

/// Turns a received response into `T` or a categorized error.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.bytes().await.map_err(|e| {
        tracing::warn!(%status, error = %e, "response body interrupted");
        ApiError::transport()
    })?;

    if !status.is_success() {
        let err = ApiError::from_error_body(status.as_u16(), &body);
        tracing::debug!(status = err.status, message = %err.message, "service returned an error");
        return Err(err);
    }

    serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(%status, error = %e, "undecodable response body");
        ApiError::unexpected()
    })
}
