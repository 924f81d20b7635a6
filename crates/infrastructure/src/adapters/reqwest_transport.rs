//! HTTP transport implementation using reqwest.
//!
//! This adapter implements the `HttpTransport` port. It resolves request
//! paths against the configured API base URL and hands back every HTTP
//! response, leaving status interpretation to the application layer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Url};
use tracing::debug;

use artdesk_application::ports::{HttpTransport, TransportError};
use artdesk_domain::{ApiBody, ApiRequest, ApiResponse, HttpMethod};

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Backend transport over `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a transport for the given API base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the client cannot
    /// be created.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("Artdesk/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Self::with_client(client, base_url, timeout)
    }

    /// Creates a transport around an existing reqwest client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse.
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| TransportError::InvalidUrl(format!("{e}: {base_url}")))?;
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// The API base URL, without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins a request path onto the base URL, keeping the base's own path.
    fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        let joined = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|e| TransportError::InvalidUrl(format!("{e}: {joined}")))
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn build_body(builder: RequestBuilder, body: ApiBody) -> Result<RequestBuilder, TransportError> {
        match body {
            ApiBody::Empty => Ok(builder),
            ApiBody::Json(value) => Ok(builder.json(&value)),
            ApiBody::Multipart { field, attachment } => {
                let part = Part::bytes(attachment.bytes)
                    .file_name(attachment.file_name)
                    .mime_str(&attachment.content_type)
                    .map_err(|e| TransportError::InvalidBody(format!("Invalid MIME type: {e}")))?;
                Ok(builder.multipart(Form::new().part(field, part)))
            }
        }
    }

    /// Maps reqwest errors to `TransportError`.
    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout { timeout_ms };
        }
        if error.is_connect() {
            return TransportError::ConnectionFailed(error.to_string());
        }
        if error.is_builder() {
            return TransportError::InvalidBody(error.to_string());
        }
        TransportError::Other(error.to_string())
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(&request.path)?;
        let timeout_ms = self.timeout_ms();
        debug!(method = %request.method, %url, "http request");

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url)
            .timeout(self.timeout)
            .header("Accept", "application/json");
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        builder = Self::build_body(builder, request.body)?;

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, timeout_ms))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Other(format!("Failed to read body: {e}")))?
            .to_vec();

        debug!(status, bytes = body.len(), "http response");
        Ok(ApiResponse::new(status, body))
    }
}
