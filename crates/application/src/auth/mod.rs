//! Identity and request authorization.
//!
//! This module provides:
//! - The session manager owning the authoritative `{user, credential}` pair
//! - The request authorizer attaching credentials to backend calls
//! - Identity strategies (mock, backend-of-record, federated)

mod authorizer;
mod manager;
pub mod sources;

pub use authorizer::{RequestAuthorizer, UnauthorizedSignal};
pub use manager::{RegistrationOutcome, RestoreOutcome, SessionManager};
