//! Engine context.
//!
//! Wires the session manager, the request authorizer and the resource stores
//! around one identity source, one credential store and one transport. Hosts
//! hold an `Engine` and pass it where it is needed; nothing here is global.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use artdesk_domain::Session;

use crate::auth::{RequestAuthorizer, RestoreOutcome, SessionManager};
use crate::error::EngineResult;
use crate::ports::{CredentialStore, HttpTransport, IdentitySource};
use crate::resources::{AnalyticsStore, ResourceStore};

/// Engine behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineOptions {
    /// End the session when the backend rejects the current credential.
    pub clear_session_on_unauthorized: bool,
}

/// The session and client-state synchronization engine.
pub struct Engine {
    sessions: Arc<SessionManager>,
    authorizer: Arc<RequestAuthorizer>,
    artworks: ResourceStore,
    contacts: ResourceStore,
    analytics: AnalyticsStore,
    options: EngineOptions,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    /// Builds an engine. Nothing runs until [`start`](Self::start).
    #[must_use]
    pub fn new(
        source: Arc<dyn IdentitySource>,
        credentials: Arc<dyn CredentialStore>,
        transport: Arc<dyn HttpTransport>,
        options: EngineOptions,
    ) -> Self {
        let sessions = Arc::new(SessionManager::new(
            Arc::clone(&source),
            Arc::clone(&credentials),
        ));
        let authorizer = Arc::new(RequestAuthorizer::new(transport, credentials, source));
        Self {
            artworks: ResourceStore::artworks(Arc::clone(&authorizer), sessions.subscribe()),
            contacts: ResourceStore::contacts(Arc::clone(&authorizer), sessions.subscribe()),
            analytics: AnalyticsStore::new(Arc::clone(&authorizer), sessions.subscribe()),
            sessions,
            authorizer,
            options,
            listener: Mutex::new(None),
        }
    }

    /// Restores the previous session and, if enabled, starts reacting to
    /// unauthorized responses.
    ///
    /// # Errors
    /// See [`SessionManager::restore_session`].
    pub async fn start(&self) -> EngineResult<RestoreOutcome> {
        if self.options.clear_session_on_unauthorized {
            self.listen_for_unauthorized();
        }
        let outcome = self.sessions.restore_session().await?;
        info!(?outcome, source = %self.sessions.source().kind(), "engine started");
        Ok(outcome)
    }

    /// Signs out and drops every session-scoped cache. Provider
    /// subscriptions stay in place.
    ///
    /// # Errors
    /// See [`SessionManager::logout`]. Caches are cleared regardless.
    pub async fn logout(&self) -> EngineResult<()> {
        let result = self.sessions.logout().await;
        self.artworks.clear();
        self.contacts.clear();
        self.analytics.clear();
        result
    }

    /// Current session snapshot.
    #[must_use]
    pub fn session(&self) -> Session {
        self.sessions.session()
    }

    /// The session manager.
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// The request authorizer.
    #[must_use]
    pub fn authorizer(&self) -> &Arc<RequestAuthorizer> {
        &self.authorizer
    }

    /// Artwork store.
    #[must_use]
    pub const fn artworks(&self) -> &ResourceStore {
        &self.artworks
    }

    /// Contact store.
    #[must_use]
    pub const fn contacts(&self) -> &ResourceStore {
        &self.contacts
    }

    /// Analytics store.
    #[must_use]
    pub const fn analytics(&self) -> &AnalyticsStore {
        &self.analytics
    }

    fn listen_for_unauthorized(&self) {
        let mut slot = self.listener.lock();
        if slot.is_some() {
            return;
        }
        let mut signals = self.authorizer.subscribe_unauthorized();
        let sessions: Weak<SessionManager> = Arc::downgrade(&self.sessions);
        *slot = Some(tokio::spawn(async move {
            loop {
                let signal = match signals.recv().await {
                    Ok(signal) => signal,
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "unauthorized signals dropped");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                let Some(sessions) = sessions.upgrade() else {
                    break;
                };
                if let Err(e) = sessions.handle_unauthorized(&signal).await {
                    warn!(error = %e, "failed to end rejected session");
                }
            }
        }));
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.lock().take() {
            handle.abort();
        }
    }
}
