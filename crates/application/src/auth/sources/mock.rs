//! Local identity simulation.
//!
//! Lets hosts run every identity flow without a backend or provider. Fixed
//! rejection triggers make the failure paths reachable too.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use artdesk_domain::{
    LoginCredentials, RegistrationCredentials, Role, Token, TokenIssuer, UserProfile,
    generate_token,
};

use crate::ports::{Authenticated, IdentityError, IdentitySource, IdentitySourceKind, Registration};

/// Email that the mock always rejects at login.
pub const REJECTED_EMAIL: &str = "fail@test.com";

/// One-time password that the mock always rejects.
pub const REJECTED_OTP: &str = "000000";

const AVATAR_BASE: &str = "https://i.pravatar.cc/150?u=";

/// Identity source that never leaves the process.
#[derive(Debug, Clone, Default)]
pub struct MockIdentitySource {
    latency: Duration,
}

impl MockIdentitySource {
    /// Creates a mock that answers immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates network latency on every call.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn simulate(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn mint() -> Token {
        Token::new(generate_token("mock"), TokenIssuer::Local)
    }
}

#[async_trait]
impl IdentitySource for MockIdentitySource {
    fn kind(&self) -> IdentitySourceKind {
        IdentitySourceKind::Mock
    }

    async fn register(
        &self,
        credentials: &RegistrationCredentials,
    ) -> Result<Registration, IdentityError> {
        self.simulate().await;
        let user = UserProfile::new(
            generate_token("mock-user"),
            &credentials.email,
            credentials.display_name.clone().unwrap_or_default(),
            Role::Artist,
        )
        .with_avatar(format!("{AVATAR_BASE}{}", credentials.email));
        debug!(email = %credentials.email, "mock registration");
        Ok(Registration::SignedIn(Authenticated {
            user,
            credential: Self::mint(),
        }))
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<Authenticated, IdentityError> {
        self.simulate().await;
        if credentials.email == REJECTED_EMAIL {
            return Err(IdentityError::rejected("Invalid credentials (simulated)"));
        }
        let user = UserProfile::new("mock-user-123", &credentials.email, "Mock Tester", Role::Collector)
            .with_avatar(format!("{AVATAR_BASE}{}", credentials.email));
        Ok(Authenticated {
            user,
            credential: Self::mint(),
        })
    }

    async fn reset_password(&self, email: &str) -> Result<(), IdentityError> {
        self.simulate().await;
        debug!(%email, "mock password reset sent");
        Ok(())
    }

    async fn confirm_password_reset(
        &self,
        _email: &str,
        _code: &str,
        _new_password: &str,
    ) -> Result<(), IdentityError> {
        self.simulate().await;
        Ok(())
    }

    async fn verify_email(&self, _email: &str, code: &str) -> Result<(), IdentityError> {
        self.simulate().await;
        if code == REJECTED_OTP {
            return Err(IdentityError::rejected("Invalid verification code (simulated)"));
        }
        Ok(())
    }

    async fn verify_otp(&self, _email: &str, code: &str) -> Result<(), IdentityError> {
        self.simulate().await;
        if code == REJECTED_OTP {
            return Err(IdentityError::rejected("Invalid OTP (simulated)"));
        }
        Ok(())
    }

    async fn fetch_profile(&self, _credential: &Token) -> Result<UserProfile, IdentityError> {
        self.simulate().await;
        Ok(
            UserProfile::new("mock-user-restored", "restored@example.com", "Restored User", Role::Viewer)
                .with_avatar(format!("{AVATAR_BASE}restored")),
        )
    }
}
