//! Integration tests for engine start-up and teardown.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use artdesk_application::{
    EngineError, EngineOptions, InMemoryCredentialStore, MockIdentitySource, RestoreOutcome,
};
use artdesk_domain::{AuthPhase, HttpMethod, Role, Token, UserProfile};

use common::{Harness, RecordingTransport};

fn stored_session() -> Arc<InMemoryCredentialStore> {
    Arc::new(InMemoryCredentialStore::with_entry(
        Token::backend("jwt-restored"),
        Some(UserProfile::new("u1", "ada@example.com", "Ada", Role::Artist)),
    ))
}

#[tokio::test]
async fn test_start_restores_persisted_session() {
    let harness = Harness::with_store(
        Arc::new(MockIdentitySource::new()),
        stored_session(),
        EngineOptions::default(),
    );

    let outcome = harness.engine.start().await.unwrap();

    assert_eq!(outcome, RestoreOutcome::Restored);
    assert_eq!(harness.engine.session().phase(), AuthPhase::LoggedIn);
}

#[tokio::test]
async fn test_unauthorized_leaves_session_by_default() {
    let transport = RecordingTransport::new();
    transport.on(HttpMethod::Get, "/artworks", 401, json!({"message": "jwt expired"}));
    let harness = Harness::with_parts(
        Arc::new(MockIdentitySource::new()),
        stored_session(),
        transport,
        EngineOptions::default(),
    );
    harness.engine.start().await.unwrap();

    let err = harness.engine.artworks().fetch_all().await.unwrap_err();
    assert!(err.is_unauthorized());
    tokio::task::yield_now().await;

    assert_eq!(harness.engine.session().phase(), AuthPhase::LoggedIn);
    assert!(harness.store.snapshot().is_some());
}

#[tokio::test]
async fn test_unauthorized_ends_session_when_enabled() {
    let transport = RecordingTransport::new();
    transport.on(HttpMethod::Get, "/artworks", 401, json!({"message": "jwt expired"}));
    let harness = Harness::with_parts(
        Arc::new(MockIdentitySource::new()),
        stored_session(),
        transport,
        EngineOptions {
            clear_session_on_unauthorized: true,
        },
    );
    harness.engine.start().await.unwrap();
    let mut sessions = harness.engine.sessions().subscribe();

    let err = harness.engine.artworks().fetch_all().await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Unauthorized {
            status: 401,
            message: "jwt expired".into()
        }
    );

    sessions
        .wait_for(|s| s.phase() == AuthPhase::LoggedOut)
        .await
        .unwrap();
    assert!(harness.store.snapshot().is_none());
}
