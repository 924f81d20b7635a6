//! Backend-of-record identity strategy.
//!
//! The backend authenticates passwords itself and issues a session token
//! (a JWT from the client's point of view). Every flow maps to one
//! `/auth/*` endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use artdesk_domain::{LoginCredentials, RegistrationCredentials, Role, Token, UserProfile};

use super::backend_api::{BackendAuthApi, extract_token, extract_user, parse_profile};
use crate::ports::{
    Authenticated, HttpTransport, IdentityError, IdentitySource, IdentitySourceKind, Registration,
};

/// Identity source backed solely by the REST backend.
#[derive(Clone)]
pub struct BackendIdentitySource {
    api: BackendAuthApi,
}

impl BackendIdentitySource {
    /// Creates the strategy over a raw transport.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            api: BackendAuthApi::new(transport),
        }
    }

    /// Builds a session from a payload carrying a token.
    ///
    /// When the payload has no user the profile is fetched; if that fails the
    /// session starts with a minimal profile keyed by `email`.
    async fn session_from(
        &self,
        payload: &Value,
        email: &str,
    ) -> Result<Option<Authenticated>, IdentityError> {
        let Some(raw) = extract_token(payload) else {
            return Ok(None);
        };
        let credential = Token::backend(raw);
        let user = match extract_user(payload) {
            Some(user) => parse_profile(user)?,
            None => match self.api.profile(&credential).await {
                Ok(user) => user,
                Err(e) => {
                    warn!(%email, error = %e, "profile fetch failed, using minimal profile");
                    UserProfile::new(email, email, "", Role::default())
                }
            },
        };
        Ok(Some(Authenticated { user, credential }))
    }
}

#[async_trait]
impl IdentitySource for BackendIdentitySource {
    fn kind(&self) -> IdentitySourceKind {
        IdentitySourceKind::Backend
    }

    async fn register(
        &self,
        credentials: &RegistrationCredentials,
    ) -> Result<Registration, IdentityError> {
        let body = serde_json::to_value(credentials)
            .map_err(|e| IdentityError::unavailable(e.to_string()))?;
        let payload = self.api.register(body, None).await?;
        if let Some(session) = self.session_from(&payload, &credentials.email).await? {
            return Ok(Registration::SignedIn(session));
        }
        let user = extract_user(&payload).and_then(|user| parse_profile(user).ok());
        Ok(Registration::Created { user })
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<Authenticated, IdentityError> {
        let payload = self.api.login(&credentials.email, &credentials.password).await?;
        self.session_from(&payload, &credentials.email)
            .await?
            .ok_or_else(|| IdentityError::unavailable("login response did not include a token"))
    }

    async fn reset_password(&self, email: &str) -> Result<(), IdentityError> {
        self.api.forgot_password(email).await
    }

    async fn confirm_password_reset(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), IdentityError> {
        self.api.reset_password(email, code, new_password).await
    }

    async fn verify_email(&self, email: &str, code: &str) -> Result<(), IdentityError> {
        self.api.verify_email(email, code).await
    }

    async fn verify_otp(&self, email: &str, code: &str) -> Result<(), IdentityError> {
        self.api.verify_otp(email, code).await
    }

    async fn fetch_profile(&self, credential: &Token) -> Result<UserProfile, IdentityError> {
        self.api.profile(credential).await
    }
}
