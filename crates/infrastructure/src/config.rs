//! Client settings.
//!
//! Layers, lowest precedence first: built-in defaults, an optional TOML file
//! (`artdesk.toml` unless told otherwise), then `ARTDESK_*` environment
//! variables. Nested keys use `__`, e.g. `ARTDESK_FEDERATION__API_KEY`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use artdesk_application::{EngineOptions, IdentitySourceKind};

use crate::adapters::DEFAULT_API_URL;
use crate::identity::{DEFAULT_IDENTITY_URL, DEFAULT_TOKEN_URL, ProviderEndpoints};

/// Settings file looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "artdesk.toml";

const ENV_PREFIX: &str = "ARTDESK";

/// Error type for settings loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A source could not be read or parsed.
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    /// The merged settings are inconsistent.
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Federated provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FederationSettings {
    /// Web API key; required for the federated identity strategy.
    pub api_key: Option<String>,
    /// Base URL of the `accounts:*` endpoints.
    pub identity_url: String,
    /// Secure-token endpoint.
    pub token_url: String,
}

impl Default for FederationSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            identity_url: DEFAULT_IDENTITY_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }
}

/// Everything the engine host needs to connect.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Backend API base URL.
    pub api_url: String,
    /// Identity strategy.
    pub identity: IdentitySourceKind,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Credential file override; the platform config directory otherwise.
    pub credential_path: Option<PathBuf>,
    /// Clear the session when the backend rejects the stored credential.
    pub clear_session_on_unauthorized: bool,
    /// Federated provider settings.
    pub federation: FederationSettings,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            identity: IdentitySourceKind::default(),
            request_timeout_secs: 30,
            credential_path: None,
            clear_session_on_unauthorized: false,
            federation: FederationSettings::default(),
        }
    }
}

impl ClientSettings {
    /// Loads settings from `file` (or [`DEFAULT_SETTINGS_FILE`]) and the
    /// process environment. A missing file is not an error unless it was
    /// named explicitly.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the result is invalid.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_sources(file, Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn from_sources(file: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_SETTINGS_FILE).required(false),
        };
        let settings: Self = Config::builder()
            .add_source(file_source)
            .add_source(env)
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.api_url)
            .map_err(|e| ConfigError::Invalid(format!("api_url {:?}: {e}", self.api_url)))?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be positive".into(),
            ));
        }
        if self.identity == IdentitySourceKind::Federated && self.federation_endpoints().is_none() {
            return Err(ConfigError::Invalid(
                "federated identity requires federation.api_key".into(),
            ));
        }
        Ok(())
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Engine behavior switches.
    #[must_use]
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            clear_session_on_unauthorized: self.clear_session_on_unauthorized,
        }
    }

    /// Provider endpoints, when an API key is configured.
    #[must_use]
    pub fn federation_endpoints(&self) -> Option<ProviderEndpoints> {
        let api_key = self
            .federation
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())?;
        Some(ProviderEndpoints {
            api_key: api_key.to_string(),
            identity_url: self.federation.identity_url.clone(),
            token_url: self.federation.token_url.clone(),
        })
    }
}
