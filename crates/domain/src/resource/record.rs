//! Normalized resource records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ResourceKind;
use crate::auth::scalar_to_string;
use crate::error::{DomainError, DomainResult};

/// Field name under which a record's origin is exposed.
pub const ORIGIN_FIELD: &str = "_origin";

/// Whether a record's current field values were confirmed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrigin {
    /// Carries an optimistic local change not yet confirmed.
    Local,
    /// Matches what the server last returned.
    #[default]
    Server,
}

/// A backend record with its canonical identifier derived at ingestion.
///
/// The raw `id` field is lifted out of `fields`; lookups only ever use
/// [`ResourceRecord::id`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceRecord {
    id: String,
    #[serde(rename = "_origin")]
    origin: RecordOrigin,
    #[serde(skip)]
    kind: ResourceKind,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl ResourceRecord {
    /// Derives the canonical id from `id`, falling back to the kind's alias.
    #[must_use]
    pub fn canonical_id(kind: ResourceKind, fields: &Map<String, Value>) -> Option<String> {
        fields
            .get("id")
            .and_then(scalar_to_string)
            .or_else(|| fields.get(kind.alias_field()).and_then(scalar_to_string))
    }

    /// Normalizes a server payload into a record.
    ///
    /// # Errors
    /// Returns `InvalidPayload` for non-objects and `MissingIdentifier` when
    /// neither `id` nor the alias field holds a usable value.
    pub fn from_server(kind: ResourceKind, payload: Value) -> DomainResult<Self> {
        let Value::Object(mut fields) = payload else {
            return Err(DomainError::InvalidPayload(format!(
                "{kind} record must be a JSON object"
            )));
        };

        let id = Self::canonical_id(kind, &fields).ok_or(DomainError::MissingIdentifier {
            kind: kind.label(),
            alias: kind.alias_field(),
        })?;
        fields.remove("id");
        fields.remove(ORIGIN_FIELD);

        Ok(Self {
            id,
            origin: RecordOrigin::Server,
            kind,
            fields,
        })
    }

    /// The canonical id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The resource kind.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Whether the record carries unconfirmed local changes.
    #[must_use]
    pub const fn origin(&self) -> RecordOrigin {
        self.origin
    }

    /// Domain fields, excluding the canonical id.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// A single domain field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The `status` field as a string, if present.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.field("status").and_then(Value::as_str)
    }

    /// Applies a local change and marks the record as `Local`.
    ///
    /// Identifier fields are never rewritten; returns `false` in that case.
    pub fn set_field(&mut self, name: &str, value: Value) -> bool {
        if name == "id" || name == self.kind.alias_field() || name == ORIGIN_FIELD {
            return false;
        }
        self.fields.insert(name.to_string(), value);
        self.origin = RecordOrigin::Local;
        true
    }

    /// Marks local changes as confirmed by the server.
    pub fn confirm(&mut self) {
        self.origin = RecordOrigin::Server;
    }

    /// Renders the record back to JSON with the canonical `id`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
