//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field was missing or blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The password confirmation did not match the password.
    #[error("password confirmation does not match")]
    PasswordMismatch,

    /// A server record carried no usable identifier.
    #[error("{kind} record has no `id` or `{alias}` field")]
    MissingIdentifier {
        /// Resource kind label.
        kind: &'static str,
        /// The kind-specific alias field that was also absent.
        alias: &'static str,
    },

    /// A payload had an unexpected JSON shape.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The resource kind does not accept attachments.
    #[error("{0} records do not support attachments")]
    AttachmentNotSupported(&'static str),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
