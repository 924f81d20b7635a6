//! HTTP methods the backend API uses.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Verb of an [`ApiRequest`](super::ApiRequest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// Read.
    #[default]
    Get,
    /// Create, or trigger an action.
    Post,
    /// Replace a record's fields.
    Put,
    /// Remove.
    Delete,
}

impl HttpMethod {
    /// Wire name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
