//! Session state types.
//!
//! `Session` is the single authoritative `{user, credential}` pair. Its fields
//! are private so the pairing invariant (a credential never exists without a
//! user) holds for every value that can be constructed.

use serde::{Deserialize, Serialize};

use crate::auth::{Token, UserProfile};

/// Progress of the most recent session operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionStatus {
    /// Nothing in flight.
    #[default]
    Idle,
    /// An identity operation is in flight.
    Loading,
    /// The last identity operation failed.
    Error {
        /// Human-readable error message.
        message: String,
    },
}

/// Coarse authentication phase derived from a `Session`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthPhase {
    /// No credential.
    LoggedOut,
    /// An identity operation is in flight.
    Authenticating,
    /// A user and credential are present.
    LoggedIn,
}

/// The current user and the credential that proves it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    user: Option<UserProfile>,
    credential: Option<Token>,
    status: SessionStatus,
}

impl Session {
    /// An empty, idle session.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            user: None,
            credential: None,
            status: SessionStatus::Idle,
        }
    }

    /// A fully authenticated, idle session.
    #[must_use]
    pub const fn authenticated(user: UserProfile, credential: Token) -> Self {
        Self {
            user: Some(user),
            credential: Some(credential),
            status: SessionStatus::Idle,
        }
    }

    /// A session that knows the user but holds no credential yet.
    #[must_use]
    pub const fn profile_only(user: UserProfile) -> Self {
        Self {
            user: Some(user),
            credential: None,
            status: SessionStatus::Idle,
        }
    }

    /// The current user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    /// The current credential, if any.
    #[must_use]
    pub const fn credential(&self) -> Option<&Token> {
        self.credential.as_ref()
    }

    /// The status of the last identity operation.
    #[must_use]
    pub const fn status(&self) -> &SessionStatus {
        &self.status
    }

    /// The last recorded error message, if the status is `Error`.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            SessionStatus::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Whether both a user and a credential are present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.credential.is_some()
    }

    /// Whether an identity operation is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.status, SessionStatus::Loading)
    }

    /// Derives the authentication phase.
    #[must_use]
    pub const fn phase(&self) -> AuthPhase {
        if self.is_loading() {
            AuthPhase::Authenticating
        } else if self.credential.is_some() {
            AuthPhase::LoggedIn
        } else {
            AuthPhase::LoggedOut
        }
    }

    /// Marks an identity operation as in flight.
    pub fn begin(&mut self) {
        self.status = SessionStatus::Loading;
    }

    /// Marks the in-flight operation as finished without changing identity.
    pub fn settle(&mut self) {
        self.status = SessionStatus::Idle;
    }

    /// Records a failure without changing identity.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = SessionStatus::Error {
            message: message.into(),
        };
    }

    /// Replaces identity with an authenticated pair and goes idle.
    pub fn establish(&mut self, user: UserProfile, credential: Token) {
        *self = Self::authenticated(user, credential);
    }

    /// Drops user and credential and goes idle.
    pub fn clear(&mut self) {
        *self = Self::empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn user() -> UserProfile {
        UserProfile::new("u1", "a@b.c", "A", Role::Artist)
    }

    #[test]
    fn test_session_phase_transitions() {
        let mut session = Session::empty();
        assert_eq!(session.phase(), AuthPhase::LoggedOut);

        session.begin();
        assert_eq!(session.phase(), AuthPhase::Authenticating);

        session.establish(user(), Token::backend("t"));
        assert_eq!(session.phase(), AuthPhase::LoggedIn);
        assert!(session.is_authenticated());

        session.clear();
        assert_eq!(session.phase(), AuthPhase::LoggedOut);
        assert!(session.user().is_none());
        assert!(session.credential().is_none());
    }

    #[test]
    fn test_fail_keeps_identity() {
        let mut session = Session::authenticated(user(), Token::backend("t"));
        session.fail("boom");
        assert_eq!(session.error_message(), Some("boom"));
        assert!(session.credential().is_some());
        assert_eq!(session.phase(), AuthPhase::LoggedIn);
    }

    #[test]
    fn test_profile_only_is_logged_out() {
        let session = Session::profile_only(user());
        assert!(!session.is_authenticated());
        assert_eq!(session.phase(), AuthPhase::LoggedOut);
    }
}
