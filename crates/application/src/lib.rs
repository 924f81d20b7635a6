//! Artdesk Application - Session and client-state synchronization
//!
//! This crate defines the application layer with:
//! - Port traits (transport, credential store, identity sources)
//! - The identity session manager and request authorizer
//! - Resource cache stores and the engine context wiring them together
//! - Application-level error handling

pub mod auth;
pub mod engine;
pub mod error;
pub mod ports;
pub mod resources;

pub use auth::sources::{BackendIdentitySource, FederatedIdentitySource, MockIdentitySource};
pub use auth::{
    RegistrationOutcome, RequestAuthorizer, RestoreOutcome, SessionManager, UnauthorizedSignal,
};
pub use engine::{Engine, EngineOptions};
pub use error::{EngineError, EngineResult};
pub use ports::{
    Authenticated, CredentialStore, CredentialStoreError, FederatedProvider, HttpTransport,
    IdentityError, IdentitySource, IdentitySourceKind, InMemoryCredentialStore, ProviderSignIn,
    ProviderState, Registration, StoredCredentials, TransportError,
};
pub use resources::{AnalyticsState, AnalyticsStore, ResourceState, ResourceStore};
