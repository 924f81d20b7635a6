//! Federated identity strategy.
//!
//! The provider verifies passwords and issues short-lived ID tokens; the
//! backend-of-record mirrors accounts and owns the business profile.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::watch;
use tracing::{debug, warn};

use artdesk_domain::{LoginCredentials, RegistrationCredentials, Token, UserProfile};

use super::backend_api::{BackendAuthApi, extract_user, parse_profile};
use crate::ports::{
    Authenticated, FederatedProvider, HttpTransport, IdentityError, IdentitySource,
    IdentitySourceKind, ProviderState, Registration,
};

/// Identity source combining a federated provider with the backend.
#[derive(Clone)]
pub struct FederatedIdentitySource {
    provider: Arc<dyn FederatedProvider>,
    backend: BackendAuthApi,
}

impl FederatedIdentitySource {
    /// Creates the strategy.
    #[must_use]
    pub fn new(provider: Arc<dyn FederatedProvider>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            provider,
            backend: BackendAuthApi::new(transport),
        }
    }
}

#[async_trait]
impl IdentitySource for FederatedIdentitySource {
    fn kind(&self) -> IdentitySourceKind {
        IdentitySourceKind::Federated
    }

    async fn register(
        &self,
        credentials: &RegistrationCredentials,
    ) -> Result<Registration, IdentityError> {
        let signed_in = self
            .provider
            .create_account(
                &credentials.email,
                &credentials.password,
                credentials.display_name.as_deref(),
            )
            .await?;
        let credential = Token::federated(signed_in.id_token);
        let mut user = signed_in.user;

        // Mirror the account on the backend so it can attach a role.
        let body = json!({
            "uid": user.id,
            "email": user.email,
            "name": user.display_name,
        });
        let payload = match self.backend.register(body, Some(&credential)).await {
            Ok(payload) => payload,
            Err(e) => {
                // The provider already signed the new account in; undo that so
                // a failed registration never leaves a live session behind.
                warn!(user_id = %user.id, error = %e, "backend mirror failed, signing out of provider");
                if let Err(sign_out) = self.provider.sign_out().await {
                    warn!(error = %sign_out, "provider sign-out after failed mirror failed");
                }
                return Err(e);
            }
        };
        if let Some(backend_user) = extract_user(&payload).and_then(|u| parse_profile(u).ok()) {
            user.merge_business_fields(&backend_user);
        }
        debug!(user_id = %user.id, "federated account mirrored on backend");

        Ok(Registration::SignedIn(Authenticated { user, credential }))
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<Authenticated, IdentityError> {
        let signed_in = self
            .provider
            .sign_in(&credentials.email, &credentials.password)
            .await?;
        Ok(Authenticated {
            user: signed_in.user,
            credential: Token::federated(signed_in.id_token),
        })
    }

    async fn enrich_profile(
        &self,
        session: &Authenticated,
    ) -> Result<Option<UserProfile>, IdentityError> {
        self.backend.profile(&session.credential).await.map(Some)
    }

    async fn logout(&self, _credential: &Token) -> Result<(), IdentityError> {
        self.provider.sign_out().await
    }

    async fn reset_password(&self, email: &str) -> Result<(), IdentityError> {
        self.provider.send_password_reset(email).await
    }

    async fn confirm_password_reset(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), IdentityError> {
        self.backend.reset_password(email, code, new_password).await
    }

    async fn verify_email(&self, email: &str, code: &str) -> Result<(), IdentityError> {
        self.backend.verify_email(email, code).await
    }

    async fn verify_otp(&self, email: &str, code: &str) -> Result<(), IdentityError> {
        self.backend.verify_otp(email, code).await
    }

    async fn fetch_profile(&self, credential: &Token) -> Result<UserProfile, IdentityError> {
        self.backend.profile(credential).await
    }

    async fn fresh_credential(&self, _cached: &Token) -> Result<Option<Token>, IdentityError> {
        Ok(self.provider.id_token(false).await?.map(Token::federated))
    }

    async fn issue_credential(&self) -> Result<Option<Token>, IdentityError> {
        Ok(self.provider.id_token(false).await?.map(Token::federated))
    }

    fn session_events(&self) -> Option<watch::Receiver<ProviderState>> {
        Some(self.provider.observe())
    }
}
