//! Federated identity provider adapters.

mod identity_toolkit;

pub use identity_toolkit::{
    DEFAULT_IDENTITY_URL, DEFAULT_TOKEN_URL, IdentityToolkitProvider, ProviderEndpoints,
};
