//! Identity strategies.

mod backend;
mod backend_api;
mod federated;
mod mock;

pub use backend::BackendIdentitySource;
pub use federated::FederatedIdentitySource;
pub use mock::{MockIdentitySource, REJECTED_EMAIL, REJECTED_OTP};
