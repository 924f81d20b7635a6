//! Resource kinds and their per-kind conventions.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DomainError, DomainResult};

/// Status assigned to new artworks when the caller does not pick one.
pub const DEFAULT_ARTWORK_STATUS: &str = "concept";

/// Backend-owned resource kinds cached by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Artwork records (`/artworks`), with an image attachment.
    Artwork,
    /// Contact records (`/contacts`).
    Contact,
}

/// What `create` does with the collection when no attachment is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatePolicy {
    /// Prepend the created record as returned by the server.
    Prepend,
    /// Re-fetch the whole collection.
    Refetch,
}

impl ResourceKind {
    /// Singular label used in messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Artwork => "artwork",
            Self::Contact => "contact",
        }
    }

    /// Collection path relative to the API base.
    #[must_use]
    pub const fn collection_path(self) -> &'static str {
        match self {
            Self::Artwork => "/artworks",
            Self::Contact => "/contacts",
        }
    }

    /// Kind-specific identifier field used when `id` is absent.
    #[must_use]
    pub const fn alias_field(self) -> &'static str {
        match self {
            Self::Artwork => "artwork_id",
            Self::Contact => "contact_id",
        }
    }

    /// Whether records of this kind accept an image attachment.
    #[must_use]
    pub const fn supports_attachment(self) -> bool {
        matches!(self, Self::Artwork)
    }

    /// How the collection is updated after a plain create.
    #[must_use]
    pub const fn create_policy(self) -> CreatePolicy {
        match self {
            Self::Artwork => CreatePolicy::Prepend,
            Self::Contact => CreatePolicy::Refetch,
        }
    }

    /// Path of a single record.
    #[must_use]
    pub fn record_path(self, id: &str) -> String {
        format!("{}/{id}", self.collection_path())
    }

    /// Path of a record's attachment sub-resource.
    #[must_use]
    pub fn attachment_path(self, id: &str) -> String {
        format!("{}/{id}/image", self.collection_path())
    }

    /// Prepares a create payload.
    ///
    /// Artworks get a numeric `price` (when given as a numeric string) and a
    /// default `status`. Other kinds pass through unchanged.
    ///
    /// # Errors
    /// Returns `InvalidPayload` if `data` is not a JSON object.
    pub fn prepare_create(self, data: Value) -> DomainResult<Value> {
        let Value::Object(mut fields) = data else {
            return Err(DomainError::InvalidPayload(format!(
                "{} data must be a JSON object",
                self.label()
            )));
        };

        if self == Self::Artwork {
            if let Some(Value::String(raw)) = fields.get("price")
                && let Some(number) = parse_number(raw)
            {
                fields.insert("price".to_string(), number);
            }
            fields
                .entry("status")
                .or_insert_with(|| Value::String(DEFAULT_ARTWORK_STATUS.to_string()));
        }

        Ok(Value::Object(fields))
    }
}

fn parse_number(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(Value::from(int));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
