//! Engine error types

use thiserror::Error;
use artdesk_domain::{DomainError, ResourceKind};

use crate::ports::{CredentialStoreError, TransportError};

/// Errors surfaced by identity and resource operations.
///
/// Every variant is recoverable: the failed operation can simply be invoked
/// again.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The primary identity source rejected a sign-in attempt.
    #[error("invalid credentials: {message}")]
    InvalidCredentials {
        /// Message from the identity source.
        message: String,
    },

    /// Account creation was rejected by the provider or the backend.
    #[error("registration failed: {message}")]
    RegistrationFailed {
        /// Message from whichever subsystem failed.
        message: String,
    },

    /// The operation needs a session and there is none.
    #[error("not authenticated")]
    Unauthenticated,

    /// The server rejected the attached credential.
    #[error("unauthorized ({status}): {message}")]
    Unauthorized {
        /// 401 or 403.
        status: u16,
        /// Message from the server.
        message: String,
    },

    /// The primary write succeeded but a dependent step failed.
    #[error("{kind} {id} was saved but a follow-up step failed: {message}")]
    PartialFailure {
        /// Kind of the record that was written.
        kind: ResourceKind,
        /// Canonical id of the record that exists server-side.
        id: String,
        /// Message from the failed step.
        message: String,
    },

    /// Transport failure or non-success response, message passed through.
    #[error("{message}")]
    NetworkOrServerError {
        /// HTTP status when the server answered.
        status: Option<u16>,
        /// Message from the transport or server.
        message: String,
    },

    /// Input failed a required-field check.
    #[error("invalid input: {0}")]
    Validation(#[from] DomainError),

    /// The credential store could not be read or written.
    #[error("credential storage error: {0}")]
    Storage(String),
}

impl EngineError {
    /// Builds a `NetworkOrServerError` without a status.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkOrServerError {
            status: None,
            message: message.into(),
        }
    }

    /// Whether this is an authorization failure on an attached credential.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

impl From<TransportError> for EngineError {
    fn from(error: TransportError) -> Self {
        Self::network(error.to_string())
    }
}

impl From<CredentialStoreError> for EngineError {
    fn from(error: CredentialStoreError) -> Self {
        Self::Storage(error.to_string())
    }
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
