//! Backend API response type
//!
//! Contains the status code helpers and the envelope handling shared by every
//! consumer of the backend: payloads arrive either bare or wrapped as
//! `{ "data": <payload> }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DomainError, DomainResult};

/// HTTP status code with semantic helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusCode(pub u16);

impl StatusCode {
    /// Creates a new `StatusCode`.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric status code.
    #[must_use]
    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns true if this is a 2xx success status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns true if this is a 4xx client error status.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    /// Returns true if this is a 5xx server error status.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.0 >= 500 && self.0 < 600
    }

    /// Returns true if the server rejected the attached credential.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self.0, 401 | 403)
    }

    /// Returns the canonical reason phrase for common status codes.
    #[must_use]
    pub const fn reason_phrase(&self) -> &'static str {
        match self.0 {
            200 => "OK",
            201 => "Created",
            204 => "No Content",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            409 => "Conflict",
            422 => "Unprocessable Entity",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            _ => "Unknown",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

/// A response from the backend REST API.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Raw body.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Creates a response from raw parts.
    #[must_use]
    pub const fn new(status: u16, body: Vec<u8>) -> Self {
        Self {
            status: StatusCode::new(status),
            body,
        }
    }

    /// Creates a response carrying a JSON document.
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string().into_bytes())
    }

    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the body as a lossy UTF-8 string.
    #[must_use]
    pub fn body_as_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parses the body as JSON; an empty body is `null`.
    ///
    /// # Errors
    /// Returns `InvalidPayload` when the body is not valid JSON.
    pub fn body_as_json(&self) -> DomainResult<Value> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&self.body).map_err(|e| DomainError::InvalidPayload(e.to_string()))
    }

    /// Parses the body and strips a `{ "data": ... }` envelope if present.
    ///
    /// # Errors
    /// Returns `InvalidPayload` when the body is not valid JSON.
    pub fn payload(&self) -> DomainResult<Value> {
        Ok(unwrap_envelope(self.body_as_json()?))
    }

    /// Extracts a human-readable error message from a failed response.
    ///
    /// Looks at `message`, `error` (string or `{message}`) and `data.message`,
    /// then falls back to the raw body and finally the reason phrase.
    #[must_use]
    pub fn error_message(&self) -> String {
        if let Ok(json) = self.body_as_json()
            && let Some(message) = message_from_json(&json)
        {
            return message;
        }
        let text = self.body_as_string_lossy();
        let text = text.trim();
        if text.is_empty() {
            self.status.to_string()
        } else {
            text.to_string()
        }
    }
}

/// Strips a `{ "data": ... }` envelope, leaving bare payloads untouched.
#[must_use]
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.get("data").is_some_and(|d| !d.is_null()) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn message_from_json(json: &Value) -> Option<String> {
    let text = |v: &Value| v.as_str().filter(|s| !s.is_empty()).map(String::from);

    json.get("message")
        .and_then(text)
        .or_else(|| json.get("error").and_then(text))
        .or_else(|| json.pointer("/error/message").and_then(text))
        .or_else(|| json.pointer("/data/message").and_then(text))
}
