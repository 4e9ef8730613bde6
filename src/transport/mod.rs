//! HTTP transport seam.
//!
//! The dispatcher talks to upstream providers exclusively through the
//! [`Transport`] trait; [`http::HttpTransport`] is the reqwest-backed
//! production implementation. Tests script their own implementations.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

pub mod http;

pub use http::HttpTransport;

/// Raw outcome of one upstream call: status code plus parsed body.
///
/// Non-JSON bodies are carried as a JSON string so callers can still log
/// them; shape validation happens in the adapters.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Cancellable, timeout-bounded JSON POST.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Value,
        timeout: Duration,
    ) -> Result<HttpResponse, TransportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Other(String),
}
