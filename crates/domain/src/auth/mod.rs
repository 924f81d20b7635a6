//! Identity domain types

mod credentials;
mod profile;
mod token;

pub use credentials::{LoginCredentials, RegistrationCredentials, require_code, require_email};
pub use profile::{Role, UserProfile};
pub(crate) use profile::scalar_to_string;
pub use token::{Token, TokenIssuer};
