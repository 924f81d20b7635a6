//! Builds an engine from settings.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use artdesk_application::{
    BackendIdentitySource, CredentialStore, Engine, FederatedIdentitySource, HttpTransport,
    IdentitySource, IdentitySourceKind, MockIdentitySource,
};
use artdesk_infrastructure::{
    ClientSettings, FileCredentialStore, IdentityToolkitProvider, ReqwestTransport,
    TokioFileSystem, default_path,
};

/// File next to the credentials that keeps the provider's refresh token.
const PROVIDER_RESUME_FILE: &str = "provider.json";

pub async fn connect(settings: &ClientSettings) -> Result<Engine> {
    let transport: Arc<dyn HttpTransport> = Arc::new(
        ReqwestTransport::new(&settings.api_url, settings.request_timeout())
            .context("failed to create HTTP transport")?,
    );

    let credential_path = match &settings.credential_path {
        Some(path) => path.clone(),
        None => default_path().context("no location for the credential file")?,
    };
    debug!(path = %credential_path.display(), identity = %settings.identity, "wiring engine");

    let source: Arc<dyn IdentitySource> = match settings.identity {
        IdentitySourceKind::Mock => Arc::new(MockIdentitySource::new()),
        IdentitySourceKind::Backend => {
            Arc::new(BackendIdentitySource::new(Arc::clone(&transport)))
        }
        IdentitySourceKind::Federated => {
            let endpoints = settings
                .federation_endpoints()
                .context("federated identity requires federation.api_key")?;
            let provider = Arc::new(
                IdentityToolkitProvider::new(endpoints)?
                    .with_resume_file(credential_path.with_file_name(PROVIDER_RESUME_FILE)),
            );
            if let Err(e) = provider.resume().await {
                warn!(error = %e, "identity provider unreachable, session left pending");
            }
            Arc::new(FederatedIdentitySource::new(provider, Arc::clone(&transport)))
        }
    };

    let credentials: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::new(
        TokioFileSystem::new(),
        credential_path,
    ));

    Ok(Engine::new(
        source,
        credentials,
        transport,
        settings.engine_options(),
    ))
}
