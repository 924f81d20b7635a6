//! Federated identity provider port

use async_trait::async_trait;
use tokio::sync::watch;

use artdesk_domain::UserProfile;

use super::{IdentityError, ProviderState};

/// Result of a password sign-in or account creation with the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSignIn {
    /// The provider's view of the user.
    pub user: UserProfile,
    /// Short-lived ID token.
    pub id_token: String,
}

/// The external service that verifies identity and issues short-lived
/// bearer credentials.
#[async_trait]
pub trait FederatedProvider: Send + Sync {
    /// Creates an account and signs it in.
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<ProviderSignIn, IdentityError>;

    /// Authenticates with email and password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSignIn, IdentityError>;

    /// Signs the current user out.
    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Sends a password-reset message.
    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError>;

    /// Returns an ID token for the signed-in user, refreshing it when stale
    /// or when `force_refresh` is set. `None` when nobody is signed in.
    async fn id_token(&self, force_refresh: bool) -> Result<Option<String>, IdentityError>;

    /// Subscribes to provider session changes.
    fn observe(&self) -> watch::Receiver<ProviderState>;
}
