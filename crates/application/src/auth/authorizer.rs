//! Request authorizer.
//!
//! Every backend call the resource stores make goes through here. The
//! credential is read from the credential store on each call, never cached,
//! so a login or logout is visible to the very next request.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use artdesk_domain::{ApiRequest, ApiResponse, Token};

use crate::error::{EngineError, EngineResult};
use crate::ports::{CredentialStore, HttpTransport, IdentitySource};

const SIGNAL_CAPACITY: usize = 16;

/// Emitted when the backend rejects an attached credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnauthorizedSignal {
    /// 401 or 403.
    pub status: u16,
    /// Path of the rejected request.
    pub path: String,
    /// The stored credential that was attached, if any.
    pub credential: Option<Token>,
}

/// Attaches the current credential to outgoing calls and classifies
/// responses.
pub struct RequestAuthorizer {
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn CredentialStore>,
    source: Arc<dyn IdentitySource>,
    signals: broadcast::Sender<UnauthorizedSignal>,
    rejections: AtomicU64,
}

impl RequestAuthorizer {
    /// Creates an authorizer.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn CredentialStore>,
        source: Arc<dyn IdentitySource>,
    ) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self {
            transport,
            store,
            source,
            signals,
            rejections: AtomicU64::new(0),
        }
    }

    /// Subscribes to authorization failures.
    #[must_use]
    pub fn subscribe_unauthorized(&self) -> broadcast::Receiver<UnauthorizedSignal> {
        self.signals.subscribe()
    }

    /// Number of 401/403 responses seen since creation.
    #[must_use]
    pub fn unauthorized_count(&self) -> u64 {
        self.rejections.load(Ordering::Relaxed)
    }

    /// Sends a request with the current credential attached.
    ///
    /// # Errors
    /// `Unauthorized` on 401/403, `NetworkOrServerError` on any other
    /// non-success status or transport failure, `Storage` when the
    /// credential store cannot be read.
    pub async fn send(&self, mut request: ApiRequest) -> EngineResult<ApiResponse> {
        let stored = self.store.load().await?.map(|entry| entry.token);
        if let Some(token) = &stored {
            let attached = self.attachable(token).await;
            request.set_header("Authorization", attached.authorization_header());
        }

        let method = request.method;
        let path = request.path.clone();
        debug!(%method, %path, authorized = stored.is_some(), "sending request");

        let response = self.transport.send(request).await.map_err(|e| {
            warn!(%method, %path, error = %e, "transport failure");
            EngineError::from(e)
        })?;

        if response.is_success() {
            return Ok(response);
        }

        let status = response.status.as_u16();
        let message = response.error_message();
        if response.status.is_auth_failure() {
            self.rejections.fetch_add(1, Ordering::Relaxed);
            warn!(
                %method,
                %path,
                status,
                credential = stored.as_ref().map(Token::preview).as_deref().unwrap_or("none"),
                "request unauthorized"
            );
            // No receivers is fine: nobody asked to react.
            let _ = self.signals.send(UnauthorizedSignal {
                status,
                path,
                credential: stored,
            });
            return Err(EngineError::Unauthorized { status, message });
        }

        debug!(%method, %path, status, %message, "request failed");
        Err(EngineError::NetworkOrServerError {
            status: Some(status),
            message,
        })
    }

    /// Sends a request and returns its payload with any `data` envelope
    /// removed.
    ///
    /// # Errors
    /// As [`send`](Self::send), plus `NetworkOrServerError` for a body that
    /// is not JSON.
    pub async fn send_json(&self, request: ApiRequest) -> EngineResult<Value> {
        let response = self.send(request).await?;
        response.payload().map_err(|e| EngineError::NetworkOrServerError {
            status: Some(response.status.as_u16()),
            message: e.to_string(),
        })
    }

    /// The credential to put on the wire for this request.
    async fn attachable(&self, stored: &Token) -> Token {
        if !stored.is_federated() {
            return stored.clone();
        }
        match self.source.fresh_credential(stored).await {
            Ok(Some(fresh)) => fresh,
            Ok(None) => stored.clone(),
            Err(e) => {
                warn!(error = %e, "credential refresh failed, using stored credential");
                stored.clone()
            }
        }
    }
}
