//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the engine and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod credential_store;
mod federated_provider;
mod file_system;
mod http_transport;
mod identity;

pub use credential_store::{
    CredentialStore, CredentialStoreError, InMemoryCredentialStore, StoredCredentials,
};
pub use federated_provider::{FederatedProvider, ProviderSignIn};
pub use file_system::{FileSystem, FileSystemError};
pub use http_transport::{HttpTransport, TransportError};
pub use identity::{
    Authenticated, IdentityError, IdentitySource, IdentitySourceKind, ProviderState, Registration,
};
