//! Credentials submitted by the user.

use std::fmt;

use serde::Serialize;

use crate::error::{DomainError, DomainResult};

/// Email + password for a sign-in attempt.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LoginCredentials {
    /// Account email.
    pub email: String,
    /// Plain-text password, sent only over the wire to the identity source.
    pub password: String,
}

impl LoginCredentials {
    /// Creates login credentials, trimming the email.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }

    /// Checks that both fields are present.
    ///
    /// # Errors
    /// Returns `MissingField` for a blank email or empty password.
    pub fn validate(&self) -> DomainResult<()> {
        require_email(&self.email)?;
        if self.password.is_empty() {
            return Err(DomainError::MissingField("password"));
        }
        Ok(())
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Data for creating an account.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationCredentials {
    /// Account email.
    pub email: String,
    /// Chosen password.
    pub password: String,
    /// Repeated password; checked locally, never sent.
    #[serde(skip)]
    pub password_confirmation: Option<String>,
    /// Optional display name.
    #[serde(rename = "name", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl RegistrationCredentials {
    /// Creates registration credentials without confirmation or display name.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
            password_confirmation: None,
            display_name: None,
        }
    }

    /// Sets the password confirmation.
    #[must_use]
    pub fn with_confirmation(mut self, confirmation: impl Into<String>) -> Self {
        self.password_confirmation = Some(confirmation.into());
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Checks required fields and the confirmation, if supplied.
    ///
    /// # Errors
    /// Returns `MissingField` or `PasswordMismatch`.
    pub fn validate(&self) -> DomainResult<()> {
        require_email(&self.email)?;
        if self.password.is_empty() {
            return Err(DomainError::MissingField("password"));
        }
        match &self.password_confirmation {
            Some(confirmation) if *confirmation != self.password => {
                Err(DomainError::PasswordMismatch)
            }
            _ => Ok(()),
        }
    }

    /// The sign-in half of these credentials.
    #[must_use]
    pub fn as_login(&self) -> LoginCredentials {
        LoginCredentials::new(self.email.clone(), self.password.clone())
    }
}

impl fmt::Debug for RegistrationCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationCredentials")
            .field("email", &self.email)
            .field("password", &"***")
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

/// Checks that an email field is present.
///
/// # Errors
/// Returns `MissingField("email")` when blank.
pub fn require_email(email: &str) -> DomainResult<()> {
    if email.trim().is_empty() {
        Err(DomainError::MissingField("email"))
    } else {
        Ok(())
    }
}

/// Checks that a verification code is present.
///
/// # Errors
/// Returns `MissingField("code")` when blank.
pub fn require_code(code: &str) -> DomainResult<()> {
    if code.trim().is_empty() {
        Err(DomainError::MissingField("code"))
    } else {
        Ok(())
    }
}
