//! Artdesk Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports defined in the
//! application layer: the reqwest transport, the Identity Toolkit provider,
//! the file credential store, and settings loading.

pub mod adapters;
pub mod config;
pub mod http;
pub mod identity;
pub mod persistence;
pub mod serialization;

pub use adapters::{DEFAULT_API_URL, DEFAULT_TIMEOUT, ReqwestTransport};
pub use config::{ClientSettings, ConfigError, DEFAULT_SETTINGS_FILE, FederationSettings};
pub use http::{AttachmentError, load_attachment};
pub use identity::{IdentityToolkitProvider, ProviderEndpoints};
pub use persistence::{FileCredentialStore, TokioFileSystem, default_path};
pub use serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};
