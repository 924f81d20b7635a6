//! Identity source port
//!
//! One contract for every way this client can learn "who is the user and what
//! credential proves it". Strategies (mock, backend-of-record, federated)
//! implement it and are chosen by configuration.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use artdesk_domain::{LoginCredentials, RegistrationCredentials, Token, UserProfile};

/// Which identity strategy backs the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySourceKind {
    /// Local simulation, no network.
    Mock,
    /// The backend-of-record issues session tokens.
    #[default]
    Backend,
    /// A federated provider issues credentials; the backend supplies profiles.
    Federated,
}

impl fmt::Display for IdentitySourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mock => "mock",
            Self::Backend => "backend",
            Self::Federated => "federated",
        })
    }
}

/// Errors reported by an identity source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// The source answered and refused the request.
    #[error("{message}")]
    Rejected {
        /// Message from the source, verbatim.
        message: String,
    },

    /// The source could not be reached or failed internally.
    #[error("{message}")]
    Unavailable {
        /// Message from the transport or source.
        message: String,
    },

    /// The strategy has no implementation for this flow.
    #[error("{operation} is not supported by this identity source")]
    Unsupported {
        /// Name of the flow.
        operation: &'static str,
    },
}

impl IdentityError {
    /// Builds a `Rejected` error.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Builds an `Unavailable` error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// A successful sign-in: both halves of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    /// The signed-in user.
    pub user: UserProfile,
    /// The credential proving it.
    pub credential: Token,
}

/// Outcome of account creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// The account exists but no credential was issued with it.
    Created {
        /// Profile of the new account, when the source returned one.
        user: Option<UserProfile>,
    },
    /// The account exists and the source signed the user in.
    SignedIn(Authenticated),
}

/// Provider-side session as pushed by a live observer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProviderState {
    /// The provider has not reported yet.
    #[default]
    Pending,
    /// Nobody is signed in with the provider.
    SignedOut,
    /// A user is signed in with the provider.
    SignedIn(UserProfile),
}

/// An identity strategy.
#[async_trait]
pub trait IdentitySource: Send + Sync {
    /// Which strategy this is.
    fn kind(&self) -> IdentitySourceKind;

    /// Creates an account.
    async fn register(
        &self,
        credentials: &RegistrationCredentials,
    ) -> Result<Registration, IdentityError>;

    /// Authenticates against the primary source.
    async fn login(&self, credentials: &LoginCredentials) -> Result<Authenticated, IdentityError>;

    /// Fetches a richer profile after sign-in. Callers treat failure as
    /// non-fatal.
    async fn enrich_profile(
        &self,
        _session: &Authenticated,
    ) -> Result<Option<UserProfile>, IdentityError> {
        Ok(None)
    }

    /// Ends the session with the source, if it keeps one.
    async fn logout(&self, _credential: &Token) -> Result<(), IdentityError> {
        Ok(())
    }

    /// Starts a password reset for an email.
    async fn reset_password(&self, email: &str) -> Result<(), IdentityError>;

    /// Completes a password reset with the code the user received.
    async fn confirm_password_reset(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), IdentityError>;

    /// Confirms an email address.
    async fn verify_email(&self, email: &str, code: &str) -> Result<(), IdentityError>;

    /// Checks a one-time password.
    async fn verify_otp(&self, email: &str, code: &str) -> Result<(), IdentityError>;

    /// Loads the profile that belongs to a credential.
    async fn fetch_profile(&self, credential: &Token) -> Result<UserProfile, IdentityError>;

    /// Returns a fresher credential for one outgoing request, if the source
    /// issues short-lived credentials.
    async fn fresh_credential(&self, _cached: &Token) -> Result<Option<Token>, IdentityError> {
        Ok(None)
    }

    /// Issues a credential for the user currently signed in with the source.
    async fn issue_credential(&self) -> Result<Option<Token>, IdentityError> {
        Ok(None)
    }

    /// Live session-change observer, when the source has one.
    fn session_events(&self) -> Option<watch::Receiver<ProviderState>> {
        None
    }
}
