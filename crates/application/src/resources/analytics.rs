//! Read-only analytics store.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use artdesk_domain::{ApiRequest, DashboardSnapshot, DomainError, Session};

use super::state::{AnalyticsState, InFlight};
use crate::auth::RequestAuthorizer;
use crate::error::{EngineError, EngineResult};

const DASHBOARD_PATH: &str = "/analytics/dashboard";

/// Holds the latest dashboard snapshot.
pub struct AnalyticsStore {
    authorizer: Arc<RequestAuthorizer>,
    session: watch::Receiver<Session>,
    state: watch::Sender<AnalyticsState>,
}

impl AnalyticsStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(authorizer: Arc<RequestAuthorizer>, session: watch::Receiver<Session>) -> Self {
        Self {
            authorizer,
            session,
            state: watch::Sender::new(AnalyticsState::default()),
        }
    }

    /// Snapshot of the store state.
    #[must_use]
    pub fn snapshot(&self) -> AnalyticsState {
        self.state.borrow().clone()
    }

    /// Observes every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AnalyticsState> {
        self.state.subscribe()
    }

    /// Fetches the dashboard. On failure the previous snapshot is kept.
    ///
    /// # Errors
    /// `Unauthenticated` without a session (no request is sent), `Validation`
    /// for a malformed payload, otherwise whatever the authorizer reports.
    pub async fn fetch_dashboard(&self) -> EngineResult<DashboardSnapshot> {
        if !self.session.borrow().is_authenticated() {
            return Err(self.record(EngineError::Unauthenticated));
        }
        let _in_flight = InFlight::start(&self.state);

        let snapshot = match self.load().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "dashboard fetch failed, keeping previous snapshot");
                return Err(self.record(e));
            }
        };
        debug!(activities = snapshot.activities.len(), "dashboard refreshed");
        let cached = snapshot.clone();
        self.state
            .send_modify(|state| state.snapshot = Some(cached));
        Ok(snapshot)
    }

    /// Drops the cached snapshot.
    pub fn clear(&self) {
        self.state.send_modify(AnalyticsState::reset);
    }

    async fn load(&self) -> EngineResult<DashboardSnapshot> {
        let payload = self
            .authorizer
            .send_json(ApiRequest::get(DASHBOARD_PATH))
            .await?;
        serde_json::from_value(payload)
            .map_err(|e| DomainError::InvalidPayload(format!("dashboard: {e}")).into())
    }

    fn record(&self, error: EngineError) -> EngineError {
        let message = error.to_string();
        self.state.send_modify(|state| state.error = Some(message));
        error
    }
}
