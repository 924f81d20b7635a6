//! Integration tests for the identity session manager.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use artdesk_application::auth::sources::REJECTED_EMAIL;
use artdesk_application::{
    BackendIdentitySource, EngineError, EngineOptions, FederatedIdentitySource, FederatedProvider,
    InMemoryCredentialStore, MockIdentitySource, ProviderState, RegistrationOutcome, RestoreOutcome,
    SessionManager,
    StoredCredentials, UnauthorizedSignal,
};
use artdesk_domain::{
    AuthPhase, DomainError, HttpMethod, LoginCredentials, RegistrationCredentials, Role, Token,
    TokenIssuer, UserProfile,
};

use common::{FakeProvider, Harness, RecordingTransport};

fn mock_manager(store: Arc<InMemoryCredentialStore>) -> Arc<SessionManager> {
    Arc::new(SessionManager::new(Arc::new(MockIdentitySource::new()), store))
}

fn backend_manager(
    transport: &Arc<RecordingTransport>,
    store: Arc<InMemoryCredentialStore>,
) -> Arc<SessionManager> {
    Arc::new(SessionManager::new(
        Arc::new(BackendIdentitySource::new(transport.clone())),
        store,
    ))
}

#[tokio::test]
async fn test_login_establishes_session_and_persists_it() {
    let store = Arc::new(InMemoryCredentialStore::new());
    let manager = mock_manager(store.clone());

    let user = manager
        .login(&LoginCredentials::new("ada@example.com", "pw"))
        .await
        .unwrap();

    let session = manager.session();
    assert_eq!(session.phase(), AuthPhase::LoggedIn);
    assert_eq!(session.user(), Some(&user));
    let credential = session.credential().cloned().unwrap();
    assert_eq!(credential.issuer(), TokenIssuer::Local);

    let stored = store.snapshot().unwrap();
    assert_eq!(
        stored,
        StoredCredentials {
            token: credential,
            user: Some(user),
        }
    );
}

#[tokio::test]
async fn test_rejected_login_is_invalid_credentials_and_logged_out() {
    let store = Arc::new(InMemoryCredentialStore::new());
    let manager = mock_manager(store.clone());

    let err = manager
        .login(&LoginCredentials::new(REJECTED_EMAIL, "pw"))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InvalidCredentials { .. }));
    let session = manager.session();
    assert_eq!(session.phase(), AuthPhase::LoggedOut);
    assert!(session.user().is_none());
    assert!(session.error_message().is_some());
    assert!(store.snapshot().is_none());
}

#[tokio::test]
async fn test_login_requires_email_and_password() {
    let transport = RecordingTransport::new();
    let manager = backend_manager(&transport, Arc::new(InMemoryCredentialStore::new()));

    let err = manager
        .login(&LoginCredentials::new("  ", "pw"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::Validation(DomainError::MissingField("email")));

    let err = manager
        .login(&LoginCredentials::new("a@b.c", ""))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::Validation(DomainError::MissingField("password")));
    assert_eq!(transport.count(), 0);
}

#[tokio::test]
async fn test_backend_login_fetches_profile_when_response_has_none() {
    let transport = RecordingTransport::new();
    transport.on(HttpMethod::Post, "/auth/login", 200, json!({"data": {"accessToken": "jwt-1"}}));
    transport.on(
        HttpMethod::Get,
        "/auth/profile",
        200,
        json!({"id": 7, "email": "ada@example.com", "name": "Ada", "role": "artist"}),
    );
    let store = Arc::new(InMemoryCredentialStore::new());
    let manager = backend_manager(&transport, store.clone());

    let user = manager
        .login(&LoginCredentials::new("ada@example.com", "pw"))
        .await
        .unwrap();

    assert_eq!(user.id, "7");
    assert_eq!(user.display_name, "Ada");
    assert_eq!(user.role, Role::Artist);
    let profile_call = transport.last();
    assert_eq!(profile_call.header("Authorization"), Some("Bearer jwt-1"));
    assert_eq!(store.snapshot().unwrap().token, Token::backend("jwt-1"));
}

#[tokio::test]
async fn test_backend_login_survives_failing_profile_route() {
    for status in [500, 404] {
        let transport = RecordingTransport::new();
        transport.on(HttpMethod::Post, "/auth/login", 200, json!({"token": "jwt-1"}));
        transport.on(
            HttpMethod::Get,
            "/auth/profile",
            status,
            json!({"message": "profile service down"}),
        );
        let store = Arc::new(InMemoryCredentialStore::new());
        let manager = backend_manager(&transport, store.clone());

        let user = manager
            .login(&LoginCredentials::new("ada@example.com", "pw"))
            .await
            .unwrap();

        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.display_name, "ada");
        assert_eq!(manager.session().phase(), AuthPhase::LoggedIn);
        let stored = store.snapshot().unwrap();
        assert_eq!(stored.token, Token::backend("jwt-1"));
        assert_eq!(stored.user, Some(user));
    }
}

#[tokio::test]
async fn test_backend_rejection_message_is_surfaced() {
    let transport = RecordingTransport::new();
    transport.on(
        HttpMethod::Post,
        "/auth/login",
        401,
        json!({"error": {"message": "Wrong email or password"}}),
    );
    let manager = backend_manager(&transport, Arc::new(InMemoryCredentialStore::new()));

    let err = manager
        .login(&LoginCredentials::new("ada@example.com", "bad"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::InvalidCredentials {
            message: "Wrong email or password".into()
        }
    );
}

#[tokio::test]
async fn test_registration_checks_confirmation_before_any_call() {
    let transport = RecordingTransport::new();
    let manager = backend_manager(&transport, Arc::new(InMemoryCredentialStore::new()));

    let err = manager
        .register(&RegistrationCredentials::new("a@b.c", "one").with_confirmation("two"))
        .await
        .unwrap_err();

    assert_eq!(err, EngineError::Validation(DomainError::PasswordMismatch));
    assert_eq!(transport.count(), 0);
}

#[tokio::test]
async fn test_registration_without_token_leaves_session_logged_out() {
    let transport = RecordingTransport::new();
    transport.on(
        HttpMethod::Post,
        "/auth/register",
        201,
        json!({"message": "check your inbox", "user": {"id": "u9", "email": "a@b.c"}}),
    );
    let manager = backend_manager(&transport, Arc::new(InMemoryCredentialStore::new()));

    let outcome = manager
        .register(&RegistrationCredentials::new("a@b.c", "pw").with_display_name("A"))
        .await
        .unwrap();

    let RegistrationOutcome::Created { user } = outcome else {
        panic!("unexpected outcome {outcome:?}");
    };
    assert_eq!(user.unwrap().id, "u9");
    assert_eq!(manager.session().phase(), AuthPhase::LoggedOut);
    let body = match &transport.last().body {
        artdesk_domain::ApiBody::Json(body) => body.clone(),
        other => panic!("unexpected body {other:?}"),
    };
    assert_eq!(body, json!({"email": "a@b.c", "password": "pw", "name": "A"}));
}

#[tokio::test]
async fn test_registration_failure_carries_backend_message() {
    let transport = RecordingTransport::new();
    transport.on(HttpMethod::Post, "/auth/register", 409, json!({"message": "Email already in use"}));
    let manager = backend_manager(&transport, Arc::new(InMemoryCredentialStore::new()));

    let err = manager
        .register(&RegistrationCredentials::new("a@b.c", "pw"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::RegistrationFailed {
            message: "Email already in use".into()
        }
    );
}

#[tokio::test]
async fn test_mock_registration_chains_into_login() {
    let manager = mock_manager(Arc::new(InMemoryCredentialStore::new()));

    let outcome = manager
        .register(&RegistrationCredentials::new("new@example.com", "pw"))
        .await
        .unwrap();

    let RegistrationOutcome::SignedIn(user) = outcome else {
        panic!("unexpected outcome {outcome:?}");
    };
    assert_eq!(user.role, Role::Artist);
    assert_eq!(manager.session().phase(), AuthPhase::LoggedIn);
    assert_eq!(manager.session().user(), Some(&user));
}

#[tokio::test]
async fn test_federated_register_with_failed_mirror_leaves_no_session() {
    let provider = FakeProvider::new();
    let transport = RecordingTransport::new();
    transport.on(HttpMethod::Post, "/auth/register", 500, json!({"message": "mirror down"}));
    let source = Arc::new(FederatedIdentitySource::new(provider.clone(), transport));
    let store = Arc::new(InMemoryCredentialStore::new());
    let manager = Arc::new(SessionManager::new(source, store.clone()));
    let mut sessions = manager.subscribe();
    assert_eq!(manager.restore_session().await.unwrap(), RestoreOutcome::Observing);

    let err = manager
        .register(&RegistrationCredentials::new("new@example.com", "pw"))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::RegistrationFailed { .. }));
    assert_eq!(*provider.observe().borrow(), ProviderState::SignedOut);
    tokio::task::yield_now().await;
    let session = sessions
        .wait_for(|s| s.user().is_none() && !s.is_loading())
        .await
        .unwrap()
        .clone();
    assert_eq!(session.phase(), AuthPhase::LoggedOut);
    assert!(store.snapshot().is_none());
    manager.stop_observing();
}

#[tokio::test]
async fn test_logout_clears_everything_even_if_provider_sign_out_fails() {
    let provider = FakeProvider::new();
    provider.fail_sign_out("network down");
    let transport = RecordingTransport::new();
    transport.on(HttpMethod::Get, "/auth/profile", 500, json!({"message": "boom"}));
    let source = Arc::new(FederatedIdentitySource::new(provider.clone(), transport.clone()));
    let store = Arc::new(InMemoryCredentialStore::new());
    let manager = Arc::new(SessionManager::new(source, store.clone()));

    manager
        .login(&LoginCredentials::new("ada@example.com", "correct"))
        .await
        .unwrap();
    assert!(store.snapshot().is_some());

    manager.logout().await.unwrap();

    let session = manager.session();
    assert!(session.user().is_none());
    assert!(session.credential().is_none());
    assert!(store.snapshot().is_none());
}

#[tokio::test]
async fn test_federated_login_merges_backend_business_fields() {
    let provider = FakeProvider::new();
    let transport = RecordingTransport::new();
    transport.on(
        HttpMethod::Get,
        "/auth/profile",
        200,
        json!({"data": {"uid": "uid-1", "email": "ada@example.com", "displayName": "Ada L.", "role": "admin"}}),
    );
    let source = Arc::new(FederatedIdentitySource::new(provider, transport.clone()));
    let manager = Arc::new(SessionManager::new(source, Arc::new(InMemoryCredentialStore::new())));

    let user = manager
        .login(&LoginCredentials::new("ada@example.com", "correct"))
        .await
        .unwrap();

    assert_eq!(user.id, "uid-1");
    assert_eq!(user.display_name, "Ada L.");
    assert_eq!(user.role, Role::Admin);
    assert_eq!(
        transport.last().header("Authorization"),
        Some("Bearer provider-id-token-1")
    );
}

#[tokio::test]
async fn test_failed_enrichment_keeps_provider_profile() {
    let provider = FakeProvider::new();
    let transport = RecordingTransport::new();
    transport.on(HttpMethod::Get, "/auth/profile", 503, json!({"message": "maintenance"}));
    let source = Arc::new(FederatedIdentitySource::new(provider, transport));
    let manager = Arc::new(SessionManager::new(source, Arc::new(InMemoryCredentialStore::new())));

    let user = manager
        .login(&LoginCredentials::new("ada@example.com", "correct"))
        .await
        .unwrap();

    assert_eq!(user.display_name, "ada");
    assert_eq!(user.role, Role::Viewer);
    assert_eq!(manager.session().phase(), AuthPhase::LoggedIn);
}

#[tokio::test]
async fn test_one_shot_flows_surface_messages_verbatim() {
    let provider = FakeProvider::new();
    let transport = RecordingTransport::new();
    transport.on(HttpMethod::Post, "/auth/verify-otp", 400, json!({"message": "Code expired"}));
    let source = Arc::new(FederatedIdentitySource::new(provider, transport.clone()));
    let manager = Arc::new(SessionManager::new(source, Arc::new(InMemoryCredentialStore::new())));

    let err = manager.reset_password("who@unknown.test").await.unwrap_err();
    assert_eq!(err.to_string(), "EMAIL_NOT_FOUND");

    let err = manager.verify_otp("a@b.c", "123456").await.unwrap_err();
    assert_eq!(err.to_string(), "Code expired");
    assert_eq!(manager.session().error_message(), Some("Code expired"));
    assert_eq!(manager.session().phase(), AuthPhase::LoggedOut);

    manager.reset_password("ada@example.com").await.unwrap();
    assert_eq!(manager.session().error_message(), None);
}

#[tokio::test]
async fn test_confirm_password_reset_posts_code_and_password() {
    let transport = RecordingTransport::new();
    transport.on(HttpMethod::Post, "/auth/reset-password", 200, json!({"message": "ok"}));
    let manager = backend_manager(&transport, Arc::new(InMemoryCredentialStore::new()));

    manager
        .confirm_password_reset("a@b.c", "4242", "n3w")
        .await
        .unwrap();

    assert_eq!(
        transport.last().body,
        artdesk_domain::ApiBody::Json(json!({"email": "a@b.c", "code": "4242", "password": "n3w"}))
    );
    assert!(manager.verify_email("a@b.c", " ").await.is_err());
}

#[tokio::test]
async fn test_restore_with_cached_profile_needs_no_network() {
    let user = UserProfile::new("u1", "ada@example.com", "Ada", Role::Artist);
    let store = Arc::new(InMemoryCredentialStore::with_entry(
        Token::backend("jwt-stored"),
        Some(user.clone()),
    ));
    let transport = RecordingTransport::new();
    let manager = backend_manager(&transport, store);

    let outcome = manager.restore_session().await.unwrap();

    assert_eq!(outcome, RestoreOutcome::Restored);
    assert_eq!(manager.session().user(), Some(&user));
    assert_eq!(transport.count(), 0);
}

#[tokio::test]
async fn test_restore_with_empty_store_is_logged_out() {
    let transport = RecordingTransport::new();
    let manager = backend_manager(&transport, Arc::new(InMemoryCredentialStore::new()));

    assert_eq!(manager.restore_session().await.unwrap(), RestoreOutcome::Empty);
    assert_eq!(manager.session().phase(), AuthPhase::LoggedOut);
}

#[tokio::test]
async fn test_restore_token_only_fetches_profile() {
    let store = Arc::new(InMemoryCredentialStore::with_entry(Token::backend("jwt-bare"), None));
    let transport = RecordingTransport::new();
    transport.on(HttpMethod::Get, "/auth/profile", 200, json!({"user": {"id": "u2", "email": "b@c.d"}}));
    let manager = backend_manager(&transport, store.clone());

    assert_eq!(manager.restore_session().await.unwrap(), RestoreOutcome::Restored);
    assert_eq!(manager.session().user().unwrap().id, "u2");
    assert_eq!(store.snapshot().unwrap().user.unwrap().email, "b@c.d");
}

#[tokio::test]
async fn test_restore_rejected_token_is_discarded() {
    let store = Arc::new(InMemoryCredentialStore::with_entry(Token::backend("jwt-old"), None));
    let transport = RecordingTransport::new();
    transport.on(HttpMethod::Get, "/auth/profile", 401, json!({"message": "jwt expired"}));
    let manager = backend_manager(&transport, store.clone());

    assert_eq!(manager.restore_session().await.unwrap(), RestoreOutcome::Empty);
    assert!(store.snapshot().is_none());
    assert_eq!(manager.session().phase(), AuthPhase::LoggedOut);
}

#[tokio::test]
async fn test_restore_keeps_token_when_backend_unreachable() {
    let store = Arc::new(InMemoryCredentialStore::with_entry(Token::backend("jwt-keep"), None));
    let transport = RecordingTransport::new();
    transport.on(HttpMethod::Get, "/auth/profile", 502, json!({"message": "bad gateway"}));
    let manager = backend_manager(&transport, store.clone());

    let err = manager.restore_session().await.unwrap_err();
    assert_eq!(err.to_string(), "bad gateway");
    assert!(store.snapshot().is_some());
}

#[tokio::test]
async fn test_provider_observer_drives_session() {
    let provider = FakeProvider::new();
    provider.set_id_token("observer-token");
    let transport = RecordingTransport::new();
    transport.on(HttpMethod::Get, "/auth/profile", 200, json!({"id": "uid-5", "email": "o@b.s", "role": "collector"}));
    let source = Arc::new(FederatedIdentitySource::new(provider.clone(), transport));
    let store = Arc::new(InMemoryCredentialStore::new());
    let manager = Arc::new(SessionManager::new(source, store.clone()));
    let mut sessions = manager.subscribe();

    assert_eq!(manager.restore_session().await.unwrap(), RestoreOutcome::Observing);

    provider.push(ProviderState::SignedIn(UserProfile::new("uid-5", "o@b.s", "", Role::Viewer)));
    let session = sessions
        .wait_for(|s| s.phase() == AuthPhase::LoggedIn)
        .await
        .unwrap()
        .clone();
    assert_eq!(session.credential(), Some(&Token::federated("observer-token")));
    assert_eq!(session.user().unwrap().role, Role::Collector);
    assert_eq!(store.snapshot().unwrap().token, Token::federated("observer-token"));

    provider.push(ProviderState::SignedOut);
    sessions
        .wait_for(|s| s.user().is_none())
        .await
        .unwrap();
    manager.stop_observing();
}

#[tokio::test]
async fn test_observer_reuses_cached_credential() {
    let provider = FakeProvider::new();
    provider.set_id_token("would-be-fresh");
    let transport = RecordingTransport::new();
    transport.on(HttpMethod::Get, "/auth/profile", 200, json!({"id": "uid-6", "email": "c@d.e"}));
    let store = Arc::new(InMemoryCredentialStore::with_entry(
        Token::federated("cached-token"),
        Some(UserProfile::new("uid-6", "c@d.e", "", Role::Viewer)),
    ));
    let source = Arc::new(FederatedIdentitySource::new(provider.clone(), transport));
    let manager = Arc::new(SessionManager::new(source, store));
    let mut sessions = manager.subscribe();

    manager.restore_session().await.unwrap();
    provider.push(ProviderState::SignedIn(UserProfile::new("uid-6", "c@d.e", "", Role::Viewer)));

    let session = sessions
        .wait_for(|s| s.phase() == AuthPhase::LoggedIn)
        .await
        .unwrap()
        .clone();
    assert_eq!(session.credential(), Some(&Token::federated("cached-token")));
    assert_eq!(provider.token_requests(), 0);
    manager.stop_observing();
}

#[tokio::test]
async fn test_observer_issues_new_credential_when_user_changes() {
    let provider = FakeProvider::new();
    provider.set_id_token("token-of-user-b");
    let transport = RecordingTransport::new();
    transport.on(HttpMethod::Get, "/auth/profile", 200, json!({"id": "uid-b", "email": "b@x.y"}));
    let store = Arc::new(InMemoryCredentialStore::with_entry(
        Token::federated("token-of-user-a"),
        Some(UserProfile::new("uid-a", "a@x.y", "", Role::Viewer)),
    ));
    let source = Arc::new(FederatedIdentitySource::new(provider.clone(), transport));
    let manager = Arc::new(SessionManager::new(source, store.clone()));
    let mut sessions = manager.subscribe();

    manager.restore_session().await.unwrap();
    provider.push(ProviderState::SignedIn(UserProfile::new("uid-a", "a@x.y", "", Role::Viewer)));
    sessions
        .wait_for(|s| s.credential() == Some(&Token::federated("token-of-user-a")))
        .await
        .unwrap();

    provider.push(ProviderState::SignedIn(UserProfile::new("uid-b", "b@x.y", "", Role::Viewer)));
    let session = sessions
        .wait_for(|s| s.user().is_some_and(|u| u.id == "uid-b") && s.phase() == AuthPhase::LoggedIn)
        .await
        .unwrap()
        .clone();

    assert_eq!(session.credential(), Some(&Token::federated("token-of-user-b")));
    let stored = store.snapshot().unwrap();
    assert_eq!(stored.token, Token::federated("token-of-user-b"));
    assert_eq!(stored.user.unwrap().id, "uid-b");
    manager.stop_observing();
}

#[tokio::test]
async fn test_stale_unauthorized_signal_does_not_undo_newer_login() {
    let store = Arc::new(InMemoryCredentialStore::new());
    let manager = mock_manager(store.clone());
    manager
        .login(&LoginCredentials::new("ada@example.com", "pw"))
        .await
        .unwrap();
    let current = manager.session().credential().cloned();

    let stale = UnauthorizedSignal {
        status: 401,
        path: "/artworks".into(),
        credential: Some(Token::backend("some-older-token")),
    };
    assert!(!manager.handle_unauthorized(&stale).await.unwrap());
    assert_eq!(manager.session().phase(), AuthPhase::LoggedIn);

    let live = UnauthorizedSignal {
        credential: current,
        ..stale
    };
    assert!(manager.handle_unauthorized(&live).await.unwrap());
    assert_eq!(manager.session().phase(), AuthPhase::LoggedOut);
    assert!(store.snapshot().is_none());
}

#[tokio::test]
async fn test_last_login_response_wins() {
    let harness = Harness::with_source(Arc::new(MockIdentitySource::new()), EngineOptions::default());
    let sessions = harness.engine.sessions();

    let first_credentials = LoginCredentials::new("first@example.com", "pw");
    let second_credentials = LoginCredentials::new("second@example.com", "pw");
    let (first, second) = tokio::join!(
        sessions.login(&first_credentials),
        sessions.login(&second_credentials),
    );
    first.unwrap();
    second.unwrap();

    let session = harness.engine.session();
    let stored = harness.store.snapshot().unwrap();
    assert_eq!(session.credential(), Some(&stored.token));
    assert_eq!(session.user(), stored.user.as_ref());
}
