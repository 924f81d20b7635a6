//! Backend API request values.

use serde_json::Value;

use super::HttpMethod;
use crate::resource::Attachment;

/// Body of an API request.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ApiBody {
    /// No body.
    #[default]
    Empty,
    /// JSON document.
    Json(Value),
    /// Multipart submission of a single binary field.
    Multipart {
        /// Form field name.
        field: String,
        /// The file part.
        attachment: Attachment,
    },
}

/// A request against the backend REST API.
///
/// `path` is relative to the configured API base (e.g. `/artworks/42`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path relative to the API base.
    pub path: String,
    /// Extra headers, in order.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: ApiBody,
}

impl ApiRequest {
    /// Creates a request without body or headers.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: ApiBody::Empty,
        }
    }

    /// GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// POST request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// PUT request.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// DELETE request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = ApiBody::Json(body);
        self
    }

    /// Sets a multipart body with a single file field.
    #[must_use]
    pub fn multipart(mut self, field: impl Into<String>, attachment: Attachment) -> Self {
        self.body = ApiBody::Multipart {
            field: field.into(),
            attachment,
        };
        self
    }

    /// Sets a header, replacing any existing one with the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Sets a header in place, replacing any existing one with the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    /// Gets a header value by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builders() {
        let request = ApiRequest::put("/artworks/1").json(json!({"status": "sold"}));
        assert_eq!(request.method, HttpMethod::Put);
        assert_eq!(request.path, "/artworks/1");
        assert_eq!(request.body, ApiBody::Json(json!({"status": "sold"})));
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut request = ApiRequest::get("/x").with_header("authorization", "Bearer a");
        request.set_header("Authorization", "Bearer b");
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("AUTHORIZATION"), Some("Bearer b"));
    }
}
