//! HTTP transport port

use async_trait::async_trait;
use artdesk_domain::{ApiRequest, ApiResponse};

/// Transport-level failures: the request never produced an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request timed out.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// Configured timeout.
        timeout_ms: u64,
    },

    /// The connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The target URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request body could not be encoded.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Port for sending requests to the backend REST API.
///
/// Implementations resolve `ApiRequest::path` against the configured base URL
/// and return every HTTP response, successful or not; only failures that
/// produce no response are errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request.
    ///
    /// # Errors
    ///
    /// Returns an error if no HTTP response was received.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}
