//! HTTP transport for Pulseboard.
//!
//! Every remote call the dashboard makes (credential service, metrics
//! endpoints) goes through [`ApiClient`]. Its job is small but important:
//! whatever goes wrong on the wire, the caller gets back one uniform
//! [`ApiError`] with a user-facing message and a status code.
//!
//! | Failure | `kind` | `status` | `message` |
//! |---|---|---|---|
//! | no response (connect, timeout) | `Transport` | 0 | fixed connection message |
//! | HTTP error status | `Service` | HTTP status | service's `message` field |
//! | anything else | `Unexpected` | 0 | generic fallback |

mod client;
mod error;

pub use client::{ApiClient, ApiConfig};
pub use error::{ApiError, ApiErrorKind, CONNECTION_ERROR_MESSAGE, UNEXPECTED_ERROR_MESSAGE};
