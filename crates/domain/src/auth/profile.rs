//! User profile as seen by the client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainError;

/// Business role attached to a user by the backend-of-record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Artist managing their own catalogue.
    Artist,
    /// Collector browsing and buying.
    Collector,
    /// Read-only account.
    #[default]
    Viewer,
    /// Administrative account.
    Admin,
    /// Any role this client does not know about.
    #[serde(other)]
    Other,
}

/// The authenticated user's profile.
///
/// Deserialization accepts the field spellings used by both the identity
/// provider and the backend (`id`/`uid`, `displayName`/`display_name`/`name`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "UserProfileWire")]
pub struct UserProfile {
    /// Stable user identifier.
    pub id: String,
    /// Account email.
    pub email: String,
    /// Name shown in the UI.
    pub display_name: String,
    /// Business role.
    pub role: Role,
    /// Optional avatar URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl UserProfile {
    /// Creates a profile, deriving the display name from the email when empty.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        display_name: impl Into<String>,
        role: Role,
    ) -> Self {
        let email = email.into();
        let mut display_name = display_name.into();
        if display_name.trim().is_empty() {
            display_name = default_display_name(&email);
        }
        Self {
            id: id.into(),
            email,
            display_name,
            role,
            avatar: None,
        }
    }

    /// Sets the avatar URL.
    #[must_use]
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    /// Overlays the business fields of a backend-of-record profile.
    ///
    /// Identity (`id`, `email`) stays with the credential issuer; role, display
    /// name and avatar come from the backend.
    pub fn merge_business_fields(&mut self, backend: &Self) {
        self.role = backend.role;
        if !backend.display_name.trim().is_empty() {
            self.display_name.clone_from(&backend.display_name);
        }
        if backend.avatar.is_some() {
            self.avatar.clone_from(&backend.avatar);
        }
    }
}

fn default_display_name(email: &str) -> String {
    email.split('@').next().unwrap_or_default().to_string()
}

#[derive(Deserialize)]
struct UserProfileWire {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    uid: Option<Value>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, rename = "displayName")]
    display_name_camel: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default, alias = "photoUrl", alias = "avatar_url")]
    avatar: Option<String>,
}

impl TryFrom<UserProfileWire> for UserProfile {
    type Error = DomainError;

    fn try_from(wire: UserProfileWire) -> Result<Self, Self::Error> {
        let id = wire
            .id
            .or(wire.uid)
            .as_ref()
            .and_then(scalar_to_string)
            .ok_or(DomainError::MissingField("user id"))?;
        let display_name = wire
            .display_name_camel
            .or(wire.display_name)
            .or(wire.name)
            .unwrap_or_default();

        let mut profile = Self::new(
            id,
            wire.email.unwrap_or_default(),
            display_name,
            wire.role.unwrap_or_default(),
        );
        profile.avatar = wire.avatar;
        Ok(profile)
    }
}

/// Renders a JSON string or number as an identifier string.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_deserialize_backend_shape() {
        let profile: UserProfile = serde_json::from_value(json!({
            "id": 7,
            "email": "ana@example.com",
            "name": "Ana",
            "role": "artist"
        }))
        .unwrap();

        assert_eq!(profile.id, "7");
        assert_eq!(profile.display_name, "Ana");
        assert_eq!(profile.role, Role::Artist);
    }

    #[test]
    fn test_deserialize_provider_shape() {
        let profile: UserProfile = serde_json::from_value(json!({
            "uid": "abc",
            "email": "ana@example.com",
            "displayName": "Ana B",
            "photoUrl": "https://img/ana.png"
        }))
        .unwrap();

        assert_eq!(profile.id, "abc");
        assert_eq!(profile.display_name, "Ana B");
        assert_eq!(profile.role, Role::Viewer);
        assert_eq!(profile.avatar.as_deref(), Some("https://img/ana.png"));
    }

    #[test]
    fn test_unknown_role_maps_to_other() {
        let profile: UserProfile =
            serde_json::from_value(json!({"id": "1", "email": "a@b.c", "role": "curator"}))
                .unwrap();
        assert_eq!(profile.role, Role::Other);
    }

    #[test]
    fn test_missing_id_is_rejected() {
        let result = serde_json::from_value::<UserProfile>(json!({"email": "a@b.c"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let profile = UserProfile::new("1", "sketcher@example.com", "", Role::Artist);
        assert_eq!(profile.display_name, "sketcher");
    }

    #[test]
    fn test_serialized_profile_reloads() {
        let profile =
            UserProfile::new("1", "a@b.c", "A", Role::Collector).with_avatar("https://x/y.png");
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["displayName"], "A");
        let back: UserProfile = serde_json::from_value(json).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn test_merge_business_fields() {
        let mut provider = UserProfile::new("uid-1", "a@b.c", "From Provider", Role::Viewer);
        let backend = UserProfile::new("db-9", "a@b.c", "From Backend", Role::Admin);

        provider.merge_business_fields(&backend);

        assert_eq!(provider.id, "uid-1");
        assert_eq!(provider.role, Role::Admin);
        assert_eq!(provider.display_name, "From Backend");
    }
}
