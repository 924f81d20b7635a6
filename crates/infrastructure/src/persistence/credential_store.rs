//! File-based credential store.
//!
//! The session token and cached profile live in a single JSON document, so
//! `save` and `clear` change both entries in one step:
//! ```json
//! {
//!   "schema_version": 1,
//!   "token": { "value": "eyJhbGciOi...", "issuer": "backend" },
//!   "user": { "id": "42", "email": "ada@example.com", "displayName": "Ada", "role": "artist" }
//! }
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use artdesk_application::ports::{
    CredentialStore, CredentialStoreError, FileSystem, FileSystemError, StoredCredentials,
};
use artdesk_domain::{Token, UserProfile};

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

const SCHEMA_VERSION: u32 = 1;

/// Default file name inside the application config directory.
pub const CREDENTIALS_FILE: &str = "session.json";

#[derive(Serialize, Deserialize)]
struct CredentialsFile {
    schema_version: u32,
    token: Token,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<UserProfile>,
}

fn to_store_error(e: FileSystemError) -> CredentialStoreError {
    match e {
        FileSystemError::Io(io_err) => CredentialStoreError::Io(io_err),
        other => CredentialStoreError::Io(std::io::Error::other(other.to_string())),
    }
}

/// Credential store persisted as one JSON file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore<F> {
    fs: F,
    path: PathBuf,
}

impl<F: FileSystem> FileCredentialStore<F> {
    /// Creates a store at an explicit path.
    pub const fn new(fs: F, path: PathBuf) -> Self {
        Self { fs, path }
    }

    /// Creates a store in the platform config directory
    /// (`<config_dir>/artdesk/session.json`).
    ///
    /// # Errors
    ///
    /// Returns `NoLocation` if the platform has no config directory.
    pub fn in_config_dir(fs: F) -> Result<Self, CredentialStoreError> {
        Ok(Self::new(fs, default_path()?))
    }

    /// Location of the credentials file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        PathBuf::from(staging)
    }
}

/// `<config_dir>/artdesk/session.json`.
///
/// # Errors
///
/// Returns `NoLocation` if the platform has no config directory.
pub fn default_path() -> Result<PathBuf, CredentialStoreError> {
    dirs::config_dir()
        .map(|dir| dir.join("artdesk").join(CREDENTIALS_FILE))
        .ok_or(CredentialStoreError::NoLocation)
}

#[async_trait]
impl<F: FileSystem> CredentialStore for FileCredentialStore<F> {
    async fn save(&self, token: &Token, user: &UserProfile) -> Result<(), CredentialStoreError> {
        let file = CredentialsFile {
            schema_version: SCHEMA_VERSION,
            token: token.clone(),
            user: Some(user.clone()),
        };
        let bytes = to_json_stable_bytes(&file)
            .map_err(|e| CredentialStoreError::Serialization(e.to_string()))?;

        // Write aside, then swap in, so readers never see a partial file.
        let staging = self.staging_path();
        self.fs
            .write_file(&staging, &bytes)
            .await
            .map_err(to_store_error)?;
        self.fs
            .rename(&staging, &self.path)
            .await
            .map_err(to_store_error)?;
        debug!(path = %self.path.display(), credential = %token.preview(), "credentials saved");
        Ok(())
    }

    async fn load(&self) -> Result<Option<StoredCredentials>, CredentialStoreError> {
        let bytes = match self.fs.read_file(&self.path).await {
            Ok(bytes) => bytes,
            Err(FileSystemError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(to_store_error(e)),
        };
        let file: CredentialsFile = from_json_bytes(&bytes)
            .map_err(|e| CredentialStoreError::Serialization(e.to_string()))?;
        if file.schema_version > SCHEMA_VERSION {
            return Err(CredentialStoreError::Serialization(format!(
                "unsupported schema version {}",
                file.schema_version
            )));
        }
        Ok(Some(StoredCredentials {
            token: file.token,
            user: file.user,
        }))
    }

    async fn clear(&self) -> Result<(), CredentialStoreError> {
        match self.fs.remove_file(&self.path).await {
            Ok(()) | Err(FileSystemError::NotFound(_)) => {
                debug!(path = %self.path.display(), "credentials cleared");
                Ok(())
            }
            Err(e) => Err(to_store_error(e)),
        }
    }
}
