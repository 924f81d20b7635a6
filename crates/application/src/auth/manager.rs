//! Identity session manager.
//!
//! Owns the single authoritative `Session`. All identity flows are expressed
//! as transitions on it; the credential store is kept in step after every
//! transition that changes identity.
//!
//! The session lives in a `watch` channel: writers use `send_modify`, which
//! is synchronous, so no state guard ever spans an `.await`. Concurrent flows
//! are not serialized; the last one to apply its result wins.

use std::future::Future;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use artdesk_domain::auth::{require_code, require_email};
use artdesk_domain::{
    DomainError, DomainResult, LoginCredentials, RegistrationCredentials, Session, Token,
    UserProfile,
};

use super::authorizer::UnauthorizedSignal;
use crate::error::{EngineError, EngineResult};
use crate::ports::{
    Authenticated, CredentialStore, IdentityError, IdentitySource, ProviderState, Registration,
};

/// How `restore_session` resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Nothing to restore; the session is empty.
    Empty,
    /// The session was restored from the credential store.
    Restored,
    /// The identity source's live observer now drives the session.
    Observing,
}

/// How `register` resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The new account was signed in; the session now belongs to it.
    SignedIn(UserProfile),
    /// The account exists but nobody was signed in. The session is unchanged.
    Created {
        /// Profile of the new account, when the source returned one.
        user: Option<UserProfile>,
    },
}

/// Owner of the `{user, credential}` pair.
pub struct SessionManager {
    source: Arc<dyn IdentitySource>,
    store: Arc<dyn CredentialStore>,
    session: watch::Sender<Session>,
    observer: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    /// Creates a manager with an empty session.
    #[must_use]
    pub fn new(source: Arc<dyn IdentitySource>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            source,
            store,
            session: watch::Sender::new(Session::empty()),
            observer: Mutex::new(None),
        }
    }

    /// Snapshot of the current session.
    #[must_use]
    pub fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    /// Observes every session change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    /// The identity source in use.
    #[must_use]
    pub fn source(&self) -> &Arc<dyn IdentitySource> {
        &self.source
    }

    /// Creates an account.
    ///
    /// The session becomes logged in only when the identity source signs the
    /// new account in; otherwise identity is left untouched.
    ///
    /// # Errors
    /// `Validation` for missing or mismatched fields, `RegistrationFailed`
    /// with the failing subsystem's message, `Storage` if the new session
    /// cannot be persisted.
    pub async fn register(
        &self,
        credentials: &RegistrationCredentials,
    ) -> EngineResult<RegistrationOutcome> {
        self.check(credentials.validate())?;
        self.session.send_modify(Session::begin);

        let registration = match self.source.register(credentials).await {
            Ok(registration) => registration,
            Err(e) => {
                warn!(email = %credentials.email, error = %e, "registration failed");
                return Err(self.record(EngineError::RegistrationFailed {
                    message: e.to_string(),
                }));
            }
        };

        match registration {
            Registration::SignedIn(authenticated) => {
                let user = self.sign_in_with(authenticated).await?;
                Ok(RegistrationOutcome::SignedIn(user))
            }
            Registration::Created { user } => {
                info!(
                    email = %credentials.email,
                    user_id = user.as_ref().map_or("unknown", |u| u.id.as_str()),
                    "account created without sign-in"
                );
                self.session.send_modify(Session::settle);
                Ok(RegistrationOutcome::Created { user })
            }
        }
    }

    /// Signs in with email and password.
    ///
    /// # Errors
    /// `Validation` for missing fields, `InvalidCredentials` when the identity
    /// source rejects the attempt, `NetworkOrServerError` when it cannot be
    /// reached, `Storage` if the session cannot be persisted.
    pub async fn login(&self, credentials: &LoginCredentials) -> EngineResult<UserProfile> {
        self.check(credentials.validate())?;
        self.session.send_modify(Session::begin);
        debug!(email = %credentials.email, source = %self.source.kind(), "login started");

        let authenticated = match self.source.login(credentials).await {
            Ok(authenticated) => authenticated,
            Err(e) => {
                warn!(email = %credentials.email, error = %e, "login failed");
                let error = match e {
                    IdentityError::Rejected { message } => {
                        EngineError::InvalidCredentials { message }
                    }
                    other => EngineError::network(other.to_string()),
                };
                return Err(self.record(error));
            }
        };
        self.sign_in_with(authenticated).await
    }

    /// Signs out. The local session and the credential store are cleared
    /// even when the identity source fails to sign out.
    ///
    /// # Errors
    /// `Storage` if the credential store cannot be cleared.
    pub async fn logout(&self) -> EngineResult<()> {
        let credential = self.session.borrow().credential().cloned();
        if let Some(token) = &credential
            && let Err(e) = self.source.logout(token).await
        {
            warn!(error = %e, "identity source sign-out failed");
        }

        self.session.send_modify(Session::clear);
        info!("session cleared");
        self.store.clear().await.map_err(|e| {
            error!(error = %e, "failed to clear credential store");
            EngineError::from(e)
        })
    }

    /// Starts a password reset.
    ///
    /// # Errors
    /// `Validation` for a blank email, `NetworkOrServerError` carrying the
    /// identity source's message otherwise.
    pub async fn reset_password(&self, email: &str) -> EngineResult<()> {
        self.check(require_email(email))?;
        self.one_shot("reset_password", self.source.reset_password(email.trim()))
            .await
    }

    /// Sets a new password using a reset code.
    ///
    /// # Errors
    /// As [`reset_password`](Self::reset_password).
    pub async fn confirm_password_reset(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> EngineResult<()> {
        self.check(require_email(email))?;
        self.check(require_code(code))?;
        if new_password.is_empty() {
            return Err(self.record(DomainError::MissingField("password").into()));
        }
        self.one_shot(
            "confirm_password_reset",
            self.source
                .confirm_password_reset(email.trim(), code.trim(), new_password),
        )
        .await
    }

    /// Confirms an email address.
    ///
    /// # Errors
    /// As [`reset_password`](Self::reset_password).
    pub async fn verify_email(&self, email: &str, code: &str) -> EngineResult<()> {
        self.check(require_email(email))?;
        self.check(require_code(code))?;
        self.one_shot("verify_email", self.source.verify_email(email.trim(), code.trim()))
            .await
    }

    /// Checks a one-time password.
    ///
    /// # Errors
    /// As [`reset_password`](Self::reset_password).
    pub async fn verify_otp(&self, email: &str, code: &str) -> EngineResult<()> {
        self.check(require_email(email))?;
        self.check(require_code(code))?;
        self.one_shot("verify_otp", self.source.verify_otp(email.trim(), code.trim()))
            .await
    }

    /// Rebuilds the session at start-up.
    ///
    /// With a live provider observer the observer drives the session from
    /// then on. Otherwise the credential store is read: a cached profile is
    /// trusted without a round-trip; a bare token is resolved through the
    /// identity source, and a rejected token is discarded.
    ///
    /// # Errors
    /// `NetworkOrServerError` when a bare token cannot be checked because the
    /// identity source is unreachable. The stored token is kept in that case.
    pub async fn restore_session(self: &Arc<Self>) -> EngineResult<RestoreOutcome> {
        if let Some(events) = self.source.session_events() {
            self.observe(events);
            return Ok(RestoreOutcome::Observing);
        }

        let stored = match self.store.load().await {
            Ok(Some(stored)) => stored,
            Ok(None) => return Ok(RestoreOutcome::Empty),
            Err(e) => {
                error!(error = %e, "unreadable credential store, discarding");
                if let Err(e) = self.store.clear().await {
                    error!(error = %e, "failed to clear credential store");
                }
                return Ok(RestoreOutcome::Empty);
            }
        };

        if let Some(user) = stored.user {
            info!(user_id = %user.id, credential = %stored.token.preview(), "session restored");
            self.session
                .send_modify(|session| session.establish(user, stored.token));
            return Ok(RestoreOutcome::Restored);
        }

        self.session.send_modify(Session::begin);
        match self.source.fetch_profile(&stored.token).await {
            Ok(user) => {
                if let Err(e) = self.store.save(&stored.token, &user).await {
                    warn!(error = %e, "failed to cache restored profile");
                }
                info!(user_id = %user.id, "session restored from token");
                self.session
                    .send_modify(|session| session.establish(user, stored.token));
                Ok(RestoreOutcome::Restored)
            }
            Err(IdentityError::Rejected { message }) => {
                warn!(%message, "stored credential rejected, discarding");
                self.session.send_modify(Session::clear);
                self.store.clear().await?;
                Ok(RestoreOutcome::Empty)
            }
            Err(e) => Err(self.record(EngineError::network(e.to_string()))),
        }
    }

    /// Reacts to a rejected credential by ending the session, unless the
    /// session has already moved on to a different credential.
    ///
    /// Returns whether the session was cleared.
    ///
    /// # Errors
    /// `Storage` if the credential store cannot be cleared.
    pub async fn handle_unauthorized(&self, signal: &UnauthorizedSignal) -> EngineResult<bool> {
        let Some(rejected) = &signal.credential else {
            return Ok(false);
        };
        let cleared = self.session.send_if_modified(|session| {
            if session.credential() == Some(rejected) {
                session.clear();
                true
            } else {
                false
            }
        });
        if !cleared {
            debug!(path = %signal.path, "stale unauthorized signal ignored");
            return Ok(false);
        }
        warn!(path = %signal.path, status = signal.status, "session ended by unauthorized response");
        self.store.clear().await?;
        Ok(true)
    }

    /// Stops following the provider observer, if any.
    pub fn stop_observing(&self) {
        if let Some(handle) = self.observer.lock().take() {
            handle.abort();
        }
    }

    fn observe(self: &Arc<Self>, mut events: watch::Receiver<ProviderState>) {
        let mut slot = self.observer.lock();
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        let manager: Weak<Self> = Arc::downgrade(self);
        *slot = Some(tokio::spawn(async move {
            loop {
                let state = events.borrow_and_update().clone();
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                manager.apply_provider_state(state).await;
                drop(manager);
                if events.changed().await.is_err() {
                    debug!("provider observer closed");
                    break;
                }
            }
        }));
    }

    async fn apply_provider_state(&self, state: ProviderState) {
        match state {
            ProviderState::Pending => {}
            ProviderState::SignedOut => {
                let had_session = self.session.send_if_modified(|session| {
                    let had = session.user().is_some();
                    session.clear();
                    had
                });
                if had_session {
                    info!("provider signed out, session cleared");
                }
                if let Err(e) = self.store.clear().await {
                    error!(error = %e, "failed to clear credential store");
                }
            }
            ProviderState::SignedIn(user) => {
                let credential = match self.cached_credential(&user.id).await {
                    Some(token) => Some(token),
                    None => self.source.issue_credential().await.unwrap_or_else(|e| {
                        warn!(error = %e, "provider could not issue a credential");
                        None
                    }),
                };
                let Some(credential) = credential else {
                    self.session
                        .send_modify(|session| *session = Session::profile_only(user));
                    return;
                };
                if let Err(e) = self.sign_in_with(Authenticated { user, credential }).await {
                    warn!(error = %e, "failed to apply provider session");
                }
            }
        }
    }

    /// Credential already held for `user_id`, from the session or the store.
    /// A credential cached for anyone else is never reused.
    async fn cached_credential(&self, user_id: &str) -> Option<Token> {
        let current = {
            let session = self.session.borrow();
            match (session.user(), session.credential()) {
                (Some(user), Some(token)) if user.id == user_id => Some(token.clone()),
                _ => None,
            }
        };
        if current.is_some() {
            return current;
        }
        match self.store.load().await {
            Ok(stored) => stored
                .filter(|entry| entry.user.as_ref().is_some_and(|user| user.id == user_id))
                .map(|entry| entry.token),
            Err(e) => {
                warn!(error = %e, "failed to read credential store");
                None
            }
        }
    }

    /// Enriches, persists and establishes an authenticated session.
    async fn sign_in_with(&self, authenticated: Authenticated) -> EngineResult<UserProfile> {
        let mut user = authenticated.user.clone();
        match self.source.enrich_profile(&authenticated).await {
            Ok(Some(profile)) => user.merge_business_fields(&profile),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "profile enrichment failed, keeping provider profile"),
        }

        let credential = authenticated.credential;
        if let Err(e) = self.store.save(&credential, &user).await {
            error!(error = %e, "failed to persist session");
            return Err(self.record(e.into()));
        }

        info!(user_id = %user.id, credential = %credential.preview(), "session established");
        let established = user.clone();
        self.session
            .send_modify(|session| session.establish(established, credential));
        Ok(user)
    }

    async fn one_shot(
        &self,
        flow: &'static str,
        call: impl Future<Output = Result<(), IdentityError>> + Send,
    ) -> EngineResult<()> {
        self.session.send_modify(Session::begin);
        match call.await {
            Ok(()) => {
                debug!(flow, "identity flow completed");
                self.session.send_modify(Session::settle);
                Ok(())
            }
            Err(e) => {
                warn!(flow, error = %e, "identity flow failed");
                Err(self.record(EngineError::network(e.to_string())))
            }
        }
    }

    fn check(&self, result: DomainResult<()>) -> EngineResult<()> {
        result.map_err(|e| self.record(e.into()))
    }

    /// Records an error on the session and hands it back.
    fn record(&self, error: EngineError) -> EngineError {
        let message = error.to_string();
        self.session.send_modify(|session| session.fail(message));
        error
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.stop_observing();
    }
}
