//! Shared fakes for the application integration tests.
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;

use artdesk_application::{
    CredentialStore, Engine, EngineOptions, FederatedProvider, HttpTransport, IdentityError,
    IdentitySource, InMemoryCredentialStore, MockIdentitySource, ProviderSignIn, ProviderState,
    TransportError,
};
use artdesk_domain::{ApiRequest, ApiResponse, HttpMethod, LoginCredentials, Role, UserProfile};

type Scripted = Result<ApiResponse, TransportError>;

/// Transport that replays scripted responses and records every request.
///
/// Responses are queued per `(method, path)`; the last queued response for a
/// route is repeated once the queue is down to one entry. Unscripted routes
/// answer 404.
#[derive(Default)]
pub struct RecordingTransport {
    routes: Mutex<HashMap<(HttpMethod, String), VecDeque<Scripted>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: HttpMethod, path: &str, status: u16, body: Value) -> &Self {
        self.push(method, path, Ok(ApiResponse::json(status, &body)))
    }

    pub fn fail(&self, method: HttpMethod, path: &str, error: TransportError) -> &Self {
        self.push(method, path, Err(error))
    }

    fn push(&self, method: HttpMethod, path: &str, response: Scripted) -> &Self {
        self.routes
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn count_for(&self, method: HttpMethod, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn last(&self) -> ApiRequest {
        self.requests.lock().last().cloned().expect("no request sent")
    }

    pub fn reset_log(&self) {
        self.requests.lock().clear();
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let key = (request.method, request.path.clone());
        self.requests.lock().push(request);
        let mut routes = self.routes.lock();
        match routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Ok(ApiResponse::json(404, &serde_json::json!({"message": "not found"}))),
        }
    }
}

/// Federated provider driven entirely by the test.
pub struct FakeProvider {
    state: watch::Sender<ProviderState>,
    id_token: Mutex<Option<String>>,
    sign_out_error: Mutex<Option<IdentityError>>,
    token_requests: Mutex<usize>,
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: watch::Sender::new(ProviderState::Pending),
            id_token: Mutex::new(None),
            sign_out_error: Mutex::new(None),
            token_requests: Mutex::new(0),
        })
    }

    pub fn set_id_token(&self, token: &str) {
        *self.id_token.lock() = Some(token.to_string());
    }

    pub fn fail_sign_out(&self, message: &str) {
        *self.sign_out_error.lock() = Some(IdentityError::unavailable(message));
    }

    pub fn push(&self, state: ProviderState) {
        self.state.send_replace(state);
    }

    pub fn token_requests(&self) -> usize {
        *self.token_requests.lock()
    }
}

#[async_trait]
impl FederatedProvider for FakeProvider {
    async fn create_account(
        &self,
        email: &str,
        _password: &str,
        display_name: Option<&str>,
    ) -> Result<ProviderSignIn, IdentityError> {
        let user = UserProfile::new("uid-new", email, display_name.unwrap_or_default(), Role::Viewer);
        self.set_id_token("provider-new-account-token");
        self.state.send_replace(ProviderState::SignedIn(user.clone()));
        Ok(ProviderSignIn {
            user,
            id_token: "provider-new-account-token".into(),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSignIn, IdentityError> {
        if password != "correct" {
            return Err(IdentityError::rejected("INVALID_PASSWORD"));
        }
        self.set_id_token("provider-id-token-1");
        Ok(ProviderSignIn {
            user: UserProfile::new("uid-1", email, "", Role::Viewer),
            id_token: "provider-id-token-1".into(),
        })
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        if let Some(error) = self.sign_out_error.lock().clone() {
            return Err(error);
        }
        *self.id_token.lock() = None;
        self.state.send_replace(ProviderState::SignedOut);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        if email.ends_with("@unknown.test") {
            return Err(IdentityError::rejected("EMAIL_NOT_FOUND"));
        }
        Ok(())
    }

    async fn id_token(&self, _force_refresh: bool) -> Result<Option<String>, IdentityError> {
        *self.token_requests.lock() += 1;
        Ok(self.id_token.lock().clone())
    }

    fn observe(&self) -> watch::Receiver<ProviderState> {
        self.state.subscribe()
    }
}

/// Everything a test needs around one engine.
pub struct Harness {
    pub engine: Engine,
    pub transport: Arc<RecordingTransport>,
    pub store: Arc<InMemoryCredentialStore>,
}

impl Harness {
    pub fn with_source(source: Arc<dyn IdentitySource>, options: EngineOptions) -> Self {
        Self::with_store(source, Arc::new(InMemoryCredentialStore::new()), options)
    }

    pub fn with_store(
        source: Arc<dyn IdentitySource>,
        store: Arc<InMemoryCredentialStore>,
        options: EngineOptions,
    ) -> Self {
        Self::with_parts(source, store, RecordingTransport::new(), options)
    }

    pub fn with_parts(
        source: Arc<dyn IdentitySource>,
        store: Arc<InMemoryCredentialStore>,
        transport: Arc<RecordingTransport>,
        options: EngineOptions,
    ) -> Self {
        let engine = Engine::new(
            source,
            Arc::clone(&store) as Arc<dyn CredentialStore>,
            Arc::clone(&transport) as Arc<dyn HttpTransport>,
            options,
        );
        Self {
            engine,
            transport,
            store,
        }
    }

    /// Engine on the mock identity source, already logged in.
    pub async fn logged_in() -> Self {
        let harness = Self::with_source(Arc::new(MockIdentitySource::new()), EngineOptions::default());
        harness
            .engine
            .sessions()
            .login(&LoginCredentials::new("artist@example.com", "secret"))
            .await
            .unwrap();
        harness
    }
}
