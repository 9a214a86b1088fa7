//! # Transport
//!
//! The low-level building block that moves a JSON body to one of the web service endpoints and
//! hands back the raw response. It knows nothing about envelopes, tokens or result keys.
//!
//! ## How it works
//!
//! [`TouchWorksClient`](crate::TouchWorksClient) is generic over [`Transport`]. The default,
//! [`HttpTransport`], POSTs with `reqwest` and a `Content-Type: application/json` header.
//! Status codes are returned untouched; deciding what counts as a failure is the caller's job.
use crate::{BoxError, config::ClientConfig};
use async_trait::async_trait;
use http::StatusCode;
use std::time::Duration;

/// Relative path of the token acquisition endpoint.
pub const GET_TOKEN_PATH: &str = "json/GetToken";

/// Relative path of the generic action endpoint.
pub const MAGIC_JSON_PATH: &str = "json/MagicJson";

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to build the HTTP client: '{0}'")]
    Client(#[source] reqwest::Error),
    #[error("Request to '{path}' failed: '{source}'")]
    Request {
        path: String,
        #[source]
        source: BoxError,
    },
    #[error("Request to '{path}' timed out after {timeout:?}")]
    Timeout { path: String, timeout: Duration },
    #[error("'{path}' answered with HTTP status {status}")]
    Status { path: String, status: StatusCode },
}

/// A raw response: the status line and the body as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Turns a non-2xx response into a [`TransportError::Status`].
    pub fn error_for_status(self, path: &str) -> Result<Self, TransportError> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(TransportError::Status {
                path: path.to_string(),
                status: self.status,
            })
        }
    }
}

/// Sends a JSON body to an endpoint path relative to the service root.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse, TransportError>;
}

/// The `reqwest` backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse, TransportError> {
        let url = self.config.endpoint(path);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.request_error(path, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.request_error(path, e))?;

        Ok(TransportResponse { status, body })
    }
}

impl HttpTransport {
    fn request_error(&self, path: &str, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout {
                path: path.to_string(),
                timeout: self.config.request_timeout,
            }
        } else {
            TransportError::Request {
                path: path.to_string(),
                source: Box::new(error),
            }
        }
    }
}
