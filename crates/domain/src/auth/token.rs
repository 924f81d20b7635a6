//! Bearer credentials.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Who issued a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenIssuer {
    /// Short-lived ID token from the federated identity provider.
    Federated,
    /// Session token issued by the backend-of-record.
    Backend,
    /// Locally minted token (mock identity strategy).
    Local,
}

/// An opaque bearer credential.
///
/// Expiry is not tracked: an expired token is discovered when an authorized
/// call is rejected.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    value: String,
    issuer: TokenIssuer,
}

impl Token {
    /// Creates a token.
    #[must_use]
    pub fn new(value: impl Into<String>, issuer: TokenIssuer) -> Self {
        Self {
            value: value.into(),
            issuer,
        }
    }

    /// Creates a backend-issued token.
    #[must_use]
    pub fn backend(value: impl Into<String>) -> Self {
        Self::new(value, TokenIssuer::Backend)
    }

    /// Creates a provider-issued token.
    #[must_use]
    pub fn federated(value: impl Into<String>) -> Self {
        Self::new(value, TokenIssuer::Federated)
    }

    /// The raw bearer value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The issuer.
    #[must_use]
    pub const fn issuer(&self) -> TokenIssuer {
        self.issuer
    }

    /// Whether the token comes from the federated provider and may be refreshed
    /// lazily before use.
    #[must_use]
    pub const fn is_federated(&self) -> bool {
        matches!(self.issuer, TokenIssuer::Federated)
    }

    /// Returns the `Authorization` header value.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.value)
    }

    /// Get a preview of the token (first 8 chars + ...), safe for logs.
    #[must_use]
    pub fn preview(&self) -> String {
        match self.value.get(..8) {
            Some(head) if self.value.len() > 12 => format!("{head}..."),
            _ => self.value.clone(),
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &self.preview())
            .field("issuer", &self.issuer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_header() {
        let token = Token::backend("abc");
        assert_eq!(token.authorization_header(), "Bearer abc");
        assert!(!token.is_federated());
    }

    #[test]
    fn test_token_preview() {
        assert_eq!(Token::federated("abcdefghijklmnop").preview(), "abcdefgh...");
        assert_eq!(Token::federated("short").preview(), "short");
    }

    #[test]
    fn test_debug_hides_value() {
        let rendered = format!("{:?}", Token::backend("supersecretvalue123"));
        assert!(!rendered.contains("supersecretvalue123"));
        assert!(rendered.contains("supersec..."));
    }
}
