//! Federated provider over an Identity-Toolkit-compatible REST API.
//!
//! Password accounts are handled by the `accounts:*` endpoints; ID tokens are
//! refreshed through the secure-token endpoint with a `refresh_token` grant.
//! The provider's refresh token can be kept in a small JSON file so a later
//! process can [`resume`](IdentityToolkitProvider::resume) the provider
//! session.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use artdesk_application::ports::{
    FederatedProvider, FileSystem, FileSystemError, IdentityError, ProviderSignIn, ProviderState,
};
use artdesk_domain::{Role, UserProfile};

use crate::persistence::TokioFileSystem;
use crate::serialization::{from_json_bytes, to_json_stable_bytes};

/// Default Identity Toolkit base URL.
pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Default secure-token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1/token";

/// Content-Type for form-urlencoded data.
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// ID tokens this close to expiry are refreshed before use.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime assumed when the provider omits `expiresIn`.
const DEFAULT_LIFETIME: Duration = Duration::from_secs(3600);

/// Where the provider lives and how to call it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    /// Web API key sent as the `key` query parameter.
    pub api_key: String,
    /// Base URL of the `accounts:*` endpoints.
    pub identity_url: String,
    /// Secure-token endpoint URL.
    pub token_url: String,
}

impl ProviderEndpoints {
    /// Endpoints of the hosted service for the given API key.
    #[must_use]
    pub fn hosted(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            identity_url: DEFAULT_IDENTITY_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
}

/// Signed-in provider session.
#[derive(Debug, Clone)]
struct ProviderSession {
    user: UserProfile,
    id_token: String,
    refresh_token: String,
    expires_at: Instant,
}

impl ProviderSession {
    fn is_fresh(&self, now: Instant) -> bool {
        now + EXPIRY_MARGIN < self.expires_at
    }
}

#[derive(Serialize, Deserialize)]
struct ResumeFile {
    refresh_token: String,
}

fn lifetime(expires_in: Option<&str>) -> Duration {
    expires_in
        .and_then(|secs| secs.parse::<u64>().ok())
        .map_or(DEFAULT_LIFETIME, Duration::from_secs)
}

/// Pulls `error.message` out of a provider error body.
fn provider_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .pointer("/error/message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn provider_profile(
    id: String,
    email: Option<String>,
    display_name: Option<String>,
    avatar: Option<String>,
) -> UserProfile {
    let profile = UserProfile::new(
        id,
        email.unwrap_or_default(),
        display_name.unwrap_or_default(),
        Role::default(),
    );
    match avatar {
        Some(url) => profile.with_avatar(url),
        None => profile,
    }
}

/// [`FederatedProvider`] backed by the Identity Toolkit REST API.
pub struct IdentityToolkitProvider {
    endpoints: ProviderEndpoints,
    http_client: Client,
    current: Mutex<Option<ProviderSession>>,
    state: watch::Sender<ProviderState>,
    resume_path: Option<PathBuf>,
    fs: TokioFileSystem,
}

impl IdentityToolkitProvider {
    /// Creates a provider. Its session state stays `Pending` until a sign-in,
    /// sign-out or [`resume`](Self::resume).
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the HTTP client cannot be created.
    pub fn new(endpoints: ProviderEndpoints) -> Result<Self, IdentityError> {
        let http_client = Client::builder()
            .user_agent(concat!("Artdesk/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| IdentityError::unavailable(e.to_string()))?;
        Ok(Self {
            endpoints,
            http_client,
            current: Mutex::new(None),
            state: watch::Sender::new(ProviderState::Pending),
            resume_path: None,
            fs: TokioFileSystem::new(),
        })
    }

    /// Keeps the refresh token in `path` across processes.
    #[must_use]
    pub fn with_resume_file(mut self, path: PathBuf) -> Self {
        self.resume_path = Some(path);
        self
    }

    /// Restores the provider session from the resume file, publishing
    /// `SignedIn` on success and `SignedOut` otherwise.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the provider cannot be reached; the resume file
    /// is kept and the state stays `Pending` in that case.
    pub async fn resume(&self) -> Result<bool, IdentityError> {
        let Some(refresh_token) = self.read_resume_file().await else {
            self.state.send_replace(ProviderState::SignedOut);
            return Ok(false);
        };

        let refreshed = match self.refresh(&refresh_token).await {
            Ok(refreshed) => refreshed,
            Err(IdentityError::Rejected { message }) => {
                warn!(%message, "stored provider session rejected");
                self.forget().await;
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        let user = self.lookup(&refreshed.id_token).await?;
        let session = ProviderSession {
            user: user.clone(),
            id_token: refreshed.id_token,
            refresh_token: refreshed.refresh_token,
            expires_at: Instant::now() + lifetime(refreshed.expires_in.as_deref()),
        };
        self.remember(session).await;
        info!(user_id = %user.id, "provider session resumed");
        Ok(true)
    }

    fn account_url(&self, method: &str) -> Result<Url, IdentityError> {
        let raw = format!(
            "{}/accounts:{method}",
            self.endpoints.identity_url.trim_end_matches('/')
        );
        self.with_key(&raw)
    }

    fn with_key(&self, raw: &str) -> Result<Url, IdentityError> {
        let mut url =
            Url::parse(raw).map_err(|e| IdentityError::unavailable(format!("{e}: {raw}")))?;
        url.query_pairs_mut()
            .append_pair("key", &self.endpoints.api_key);
        Ok(url)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &Value,
    ) -> Result<T, IdentityError> {
        let url = self.account_url(method)?;
        debug!(endpoint = method, "provider request");
        let response = self
            .http_client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| IdentityError::unavailable(e.to_string()))?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, IdentityError> {
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| IdentityError::unavailable(format!("Failed to read response: {e}")))?;

        if status.is_client_error() {
            let message = provider_message(&bytes)
                .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
            return Err(IdentityError::rejected(message));
        }
        if !status.is_success() {
            let message = provider_message(&bytes)
                .unwrap_or_else(|| format!("Provider error {}", status.as_u16()));
            return Err(IdentityError::unavailable(message));
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| IdentityError::unavailable(format!("Failed to parse response: {e}")))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, IdentityError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        let body = serde_urlencoded::to_string(&params)
            .map_err(|e| IdentityError::unavailable(format!("Failed to encode form: {e}")))?;

        let response = self
            .http_client
            .post(self.with_key(&self.endpoints.token_url)?)
            .header("Content-Type", FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| IdentityError::unavailable(e.to_string()))?;
        Self::decode(response).await
    }

    async fn lookup(&self, id_token: &str) -> Result<UserProfile, IdentityError> {
        let response: LookupResponse = self
            .post_json("lookup", &json!({ "idToken": id_token }))
            .await?;
        let user = response
            .users
            .into_iter()
            .next()
            .ok_or_else(|| IdentityError::rejected("USER_NOT_FOUND"))?;
        Ok(provider_profile(
            user.local_id,
            user.email,
            user.display_name,
            user.photo_url,
        ))
    }

    async fn establish(&self, account: AccountResponse, email: &str) -> ProviderSignIn {
        let user = provider_profile(
            account.local_id,
            account.email.or_else(|| Some(email.to_string())),
            account.display_name,
            None,
        );
        let session = ProviderSession {
            user: user.clone(),
            id_token: account.id_token.clone(),
            refresh_token: account.refresh_token,
            expires_at: Instant::now() + lifetime(account.expires_in.as_deref()),
        };
        self.remember(session).await;
        ProviderSignIn {
            user,
            id_token: account.id_token,
        }
    }

    async fn remember(&self, session: ProviderSession) {
        let user = session.user.clone();
        let refresh_token = session.refresh_token.clone();
        *self.current.lock() = Some(session);
        self.write_resume_file(&refresh_token).await;
        self.state.send_replace(ProviderState::SignedIn(user));
    }

    async fn forget(&self) {
        self.current.lock().take();
        if let Some(path) = &self.resume_path {
            match self.fs.remove_file(path).await {
                Ok(()) | Err(FileSystemError::NotFound(_)) => {}
                Err(e) => warn!(error = %e, "failed to remove provider resume file"),
            }
        }
        self.state.send_replace(ProviderState::SignedOut);
    }

    async fn read_resume_file(&self) -> Option<String> {
        let path = self.resume_path.as_ref()?;
        match self.fs.read_file(path).await {
            Ok(bytes) => match from_json_bytes::<ResumeFile>(&bytes) {
                Ok(file) => Some(file.refresh_token),
                Err(e) => {
                    warn!(error = %e, "unreadable provider resume file");
                    None
                }
            },
            Err(FileSystemError::NotFound(_)) => None,
            Err(e) => {
                warn!(error = %e, "failed to read provider resume file");
                None
            }
        }
    }

    async fn write_resume_file(&self, refresh_token: &str) {
        let Some(path) = &self.resume_path else {
            return;
        };
        let file = ResumeFile {
            refresh_token: refresh_token.to_string(),
        };
        let written = match to_json_stable_bytes(&file) {
            Ok(bytes) => self.fs.write_file(path, &bytes).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(error) = written {
            warn!(%error, "failed to write provider resume file");
        }
    }
}

#[async_trait]
impl FederatedProvider for IdentityToolkitProvider {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<ProviderSignIn, IdentityError> {
        let account: AccountResponse = self
            .post_json(
                "signUp",
                &json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;

        let mut signed_in = self.establish(account, email).await;
        if let Some(name) = display_name.filter(|name| !name.trim().is_empty()) {
            let update: Result<Value, _> = self
                .post_json(
                    "update",
                    &json!({ "idToken": signed_in.id_token, "displayName": name }),
                )
                .await;
            match update {
                Ok(_) => signed_in.user.display_name = name.to_string(),
                Err(e) => warn!(error = %e, "failed to set provider display name"),
            }
        }
        Ok(signed_in)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSignIn, IdentityError> {
        let account: AccountResponse = self
            .post_json(
                "signInWithPassword",
                &json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        Ok(self.establish(account, email).await)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.forget().await;
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        let _: Value = self
            .post_json(
                "sendOobCode",
                &json!({ "requestType": "PASSWORD_RESET", "email": email }),
            )
            .await?;
        Ok(())
    }

    async fn id_token(&self, force_refresh: bool) -> Result<Option<String>, IdentityError> {
        let Some(session) = self.current.lock().clone() else {
            return Ok(None);
        };
        if !force_refresh && session.is_fresh(Instant::now()) {
            return Ok(Some(session.id_token));
        }

        let refreshed = self.refresh(&session.refresh_token).await?;
        let expires_at = Instant::now() + lifetime(refreshed.expires_in.as_deref());
        {
            let mut current = self.current.lock();
            // A sign-out during the refresh wins.
            let Some(active) = current.as_mut() else {
                return Ok(None);
            };
            active.id_token.clone_from(&refreshed.id_token);
            active.refresh_token.clone_from(&refreshed.refresh_token);
            active.expires_at = expires_at;
        }
        self.write_resume_file(&refreshed.refresh_token).await;
        debug!("provider id token refreshed");
        Ok(Some(refreshed.id_token))
    }

    fn observe(&self) -> watch::Receiver<ProviderState> {
        self.state.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn provider() -> IdentityToolkitProvider {
        IdentityToolkitProvider::new(ProviderEndpoints {
            api_key: "test-key".into(),
            identity_url: "http://localhost:9099/v1/".into(),
            token_url: "http://localhost:9099/v1/token".into(),
        })
        .unwrap()
    }

    #[test]
    fn test_account_url_carries_key() {
        let url = provider().account_url("signInWithPassword").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9099/v1/accounts:signInWithPassword?key=test-key"
        );
    }

    #[test]
    fn test_provider_message_extraction() {
        let body = br#"{"error":{"code":400,"message":"EMAIL_NOT_FOUND","errors":[]}}"#;
        assert_eq!(provider_message(body).as_deref(), Some("EMAIL_NOT_FOUND"));
        assert_eq!(provider_message(b"<html>"), None);
    }

    #[test]
    fn test_lifetime_parsing() {
        assert_eq!(lifetime(Some("120")), Duration::from_secs(120));
        assert_eq!(lifetime(Some("soon")), DEFAULT_LIFETIME);
        assert_eq!(lifetime(None), DEFAULT_LIFETIME);
    }

    #[test]
    fn test_session_freshness_margin() {
        let now = Instant::now();
        let session = ProviderSession {
            user: UserProfile::new("u1", "a@b.c", "", Role::Viewer),
            id_token: "id".into(),
            refresh_token: "rt".into(),
            expires_at: now + Duration::from_secs(30),
        };
        assert!(!session.is_fresh(now));
        assert!(
            ProviderSession {
                expires_at: now + Duration::from_secs(600),
                ..session
            }
            .is_fresh(now)
        );
    }

    #[tokio::test]
    async fn test_id_token_without_session_is_none() {
        assert_eq!(provider().id_token(true).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_resume_without_file_signs_out() {
        let dir = tempdir().unwrap();
        let provider = provider().with_resume_file(dir.path().join("provider.json"));
        let events = provider.observe();
        assert_eq!(*events.borrow(), ProviderState::Pending);

        assert!(!provider.resume().await.unwrap());
        assert_eq!(*events.borrow(), ProviderState::SignedOut);
    }

    #[tokio::test]
    async fn test_sign_out_removes_resume_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("provider.json");
        let provider = provider().with_resume_file(path.clone());
        provider.write_resume_file("rt-1").await;
        assert_eq!(provider.read_resume_file().await.as_deref(), Some("rt-1"));

        provider.sign_out().await.unwrap();

        assert!(!path.exists());
        assert_eq!(*provider.observe().borrow(), ProviderState::SignedOut);
    }
}
