//! Credential store port
//!
//! Defines the interface for persisting the session token and cached profile
//! across process restarts.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use artdesk_domain::{Token, UserProfile};

/// Errors that can occur during credential persistence.
#[derive(Debug, thiserror::Error)]
pub enum CredentialStoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// No location is available for the store.
    #[error("No storage location available")]
    NoLocation,
}

/// What the credential store holds.
///
/// The profile is optional: a token persisted without a profile is restored
/// by fetching the profile from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    /// Bearer credential.
    pub token: Token,
    /// Cached user profile.
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// Durable storage for `{token, user}`.
///
/// `save` and `clear` act on both entries together; no caller can observe a
/// state where only one of them changed.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persists the token and the profile.
    ///
    /// # Errors
    /// Returns an error if the entries cannot be written.
    async fn save(&self, token: &Token, user: &UserProfile) -> Result<(), CredentialStoreError>;

    /// Loads the persisted entries, or `None` if there are none.
    ///
    /// # Errors
    /// Returns an error if the entries exist but cannot be read.
    async fn load(&self) -> Result<Option<StoredCredentials>, CredentialStoreError>;

    /// Removes both entries.
    ///
    /// # Errors
    /// Returns an error if the entries cannot be removed.
    async fn clear(&self) -> Result<(), CredentialStoreError>;
}

/// Process-local credential store.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    entry: Mutex<Option<StoredCredentials>>,
}

impl InMemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with entries, as if left by a previous run.
    #[must_use]
    pub fn with_entry(token: Token, user: Option<UserProfile>) -> Self {
        Self {
            entry: Mutex::new(Some(StoredCredentials { token, user })),
        }
    }

    /// Synchronous view of the current entries.
    #[must_use]
    pub fn snapshot(&self) -> Option<StoredCredentials> {
        self.entry.lock().clone()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn save(&self, token: &Token, user: &UserProfile) -> Result<(), CredentialStoreError> {
        *self.entry.lock() = Some(StoredCredentials {
            token: token.clone(),
            user: Some(user.clone()),
        });
        Ok(())
    }

    async fn load(&self) -> Result<Option<StoredCredentials>, CredentialStoreError> {
        Ok(self.entry.lock().clone())
    }

    async fn clear(&self) -> Result<(), CredentialStoreError> {
        self.entry.lock().take();
        Ok(())
    }
}
