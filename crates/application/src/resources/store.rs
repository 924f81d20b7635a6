//! Resource cache store.
//!
//! One implementation serves every resource kind; kind-specific behavior
//! (paths, identifier alias, attachment support, create policy) comes from
//! `ResourceKind`.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use artdesk_domain::resource::ATTACHMENT_FIELD;
use artdesk_domain::{
    ApiRequest, Attachment, CreatePolicy, DomainError, ResourceKind, ResourceRecord, Session,
};

use super::optimistic::mutate_or_refresh;
use super::state::{InFlight, ResourceState};
use crate::auth::RequestAuthorizer;
use crate::error::{EngineError, EngineResult};

/// Client-side cache of one backend collection.
pub struct ResourceStore {
    kind: ResourceKind,
    authorizer: Arc<RequestAuthorizer>,
    session: watch::Receiver<Session>,
    state: watch::Sender<ResourceState>,
}

impl ResourceStore {
    /// Creates an empty store for `kind`.
    #[must_use]
    pub fn new(
        kind: ResourceKind,
        authorizer: Arc<RequestAuthorizer>,
        session: watch::Receiver<Session>,
    ) -> Self {
        Self {
            kind,
            authorizer,
            session,
            state: watch::Sender::new(ResourceState::default()),
        }
    }

    /// Store for artworks.
    #[must_use]
    pub fn artworks(authorizer: Arc<RequestAuthorizer>, session: watch::Receiver<Session>) -> Self {
        Self::new(ResourceKind::Artwork, authorizer, session)
    }

    /// Store for contacts.
    #[must_use]
    pub fn contacts(authorizer: Arc<RequestAuthorizer>, session: watch::Receiver<Session>) -> Self {
        Self::new(ResourceKind::Contact, authorizer, session)
    }

    /// The kind of record held.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Snapshot of the store state.
    #[must_use]
    pub fn snapshot(&self) -> ResourceState {
        self.state.borrow().clone()
    }

    /// Observes every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResourceState> {
        self.state.subscribe()
    }

    /// Cached records in collection order.
    #[must_use]
    pub fn records(&self) -> Vec<ResourceRecord> {
        self.state.borrow().collection.as_slice().to_vec()
    }

    /// A cached record by canonical id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<ResourceRecord> {
        self.state.borrow().collection.find(id).cloned()
    }

    /// Replaces the collection with the server's.
    ///
    /// Records without a derivable id are skipped. Returns the number of
    /// records cached.
    ///
    /// # Errors
    /// `Unauthenticated` without a session (no request is sent), otherwise
    /// whatever the authorizer reports.
    pub async fn fetch_all(&self) -> EngineResult<usize> {
        if !self.session.borrow().is_authenticated() {
            return Err(self.record(EngineError::Unauthenticated));
        }
        let _in_flight = InFlight::start(&self.state);

        let payload = self
            .authorizer
            .send_json(ApiRequest::get(self.kind.collection_path()))
            .await
            .map_err(|e| self.record(e))?;
        let records = self.normalize_list(payload);
        let count = records.len();
        self.state
            .send_modify(|state| state.collection.replace_all(records));
        debug!(kind = %self.kind, count, "collection refreshed");
        Ok(count)
    }

    /// Loads one record into the current slot.
    ///
    /// # Errors
    /// Whatever the authorizer reports, or `Validation` for a payload without
    /// an id.
    pub async fn fetch_one(&self, id: &str) -> EngineResult<ResourceRecord> {
        let _in_flight = InFlight::start(&self.state);
        self.state.send_modify(|state| state.current = None);

        let record = self.load_one(id).await.map_err(|e| self.record(e))?;
        let current = record.clone();
        self.state.send_modify(|state| state.current = Some(current));
        Ok(record)
    }

    /// Creates a record, optionally uploading an attachment for it.
    ///
    /// With an attachment the record is re-fetched after the upload and
    /// placed in the collection. Without one, the kind's create policy
    /// decides between prepending the response and re-fetching the
    /// collection.
    ///
    /// # Errors
    /// `Validation` for non-object data or an attachment on a kind without
    /// attachment support (nothing is sent), `PartialFailure` when the record
    /// was created but a follow-up step failed, otherwise whatever the
    /// authorizer reports.
    pub async fn create(
        &self,
        data: Value,
        attachment: Option<Attachment>,
    ) -> EngineResult<ResourceRecord> {
        self.check_attachment(attachment.as_ref())?;
        let body = self
            .kind
            .prepare_create(data)
            .map_err(|e| self.record(e.into()))?;
        let _in_flight = InFlight::start(&self.state);

        let payload = self
            .authorizer
            .send_json(ApiRequest::post(self.kind.collection_path()).json(body))
            .await
            .map_err(|e| self.record(e))?;
        let created =
            ResourceRecord::from_server(self.kind, payload).map_err(|e| self.record(e.into()))?;
        let id = created.id().to_string();
        info!(kind = %self.kind, %id, "record created");

        if let Some(attachment) = attachment {
            let record = match self.attach_and_reload(&id, attachment).await {
                Ok(record) => record,
                Err(e) => return Err(self.record(self.partial_failure(&id, &e))),
            };
            let current = record.clone();
            self.state.send_modify(|state| {
                state.collection.upsert(current.clone());
                state.current = Some(current);
            });
            return Ok(record);
        }

        match self.kind.create_policy() {
            CreatePolicy::Prepend => {
                let record = created.clone();
                self.state
                    .send_modify(|state| state.collection.prepend(record));
                Ok(created)
            }
            CreatePolicy::Refetch => {
                if let Err(e) = self.fetch_all().await {
                    return Err(self.record(self.partial_failure(&id, &e)));
                }
                Ok(self.find(&id).unwrap_or(created))
            }
        }
    }

    /// Changes a record's status optimistically.
    ///
    /// The cached record shows the new status immediately. If the server
    /// rejects the write, the collection is re-fetched before the error is
    /// returned.
    ///
    /// # Errors
    /// Whatever the authorizer reports for the write.
    pub async fn update_status(&self, id: &str, status: &str) -> EngineResult<()> {
        let _in_flight = InFlight::start(&self.state);
        let value = Value::String(status.to_string());

        let result = mutate_or_refresh(
            || {
                self.state.send_if_modified(|state| {
                    state
                        .collection
                        .find_mut(id)
                        .is_some_and(|record| record.set_field("status", value))
                });
            },
            async {
                self.authorizer
                    .send(ApiRequest::put(self.kind.record_path(id)).json(json!({ "status": status })))
                    .await
                    .map(drop)
            },
            || async { self.fetch_all().await.map(drop) },
        )
        .await;

        match result {
            Ok(()) => {
                self.state.send_if_modified(|state| {
                    state.collection.find_mut(id).is_some_and(|record| {
                        record.confirm();
                        true
                    })
                });
                Ok(())
            }
            Err(e) => {
                warn!(kind = %self.kind, %id, error = %e, "status update reverted");
                Err(self.record(e))
            }
        }
    }

    /// Writes a record, optionally uploads a new attachment, then re-fetches
    /// the collection.
    ///
    /// # Errors
    /// `Validation` for an attachment on a kind without attachment support,
    /// `PartialFailure` when the write succeeded but the upload or the
    /// re-fetch failed, otherwise whatever the authorizer reports.
    pub async fn update(
        &self,
        id: &str,
        data: Value,
        attachment: Option<Attachment>,
    ) -> EngineResult<()> {
        self.check_attachment(attachment.as_ref())?;
        let _in_flight = InFlight::start(&self.state);

        self.authorizer
            .send(ApiRequest::put(self.kind.record_path(id)).json(data))
            .await
            .map_err(|e| self.record(e))?;

        if let Some(attachment) = attachment
            && let Err(e) = self.upload(id, attachment).await
        {
            if let Err(refresh) = self.fetch_all().await {
                warn!(kind = %self.kind, %id, error = %refresh, "refresh after failed upload failed");
            }
            return Err(self.record(self.partial_failure(id, &e)));
        }

        if let Err(e) = self.fetch_all().await {
            return Err(self.record(self.partial_failure(id, &e)));
        }
        Ok(())
    }

    /// Deletes a record. The cached copy is removed only after the server
    /// confirms.
    ///
    /// # Errors
    /// Whatever the authorizer reports; the collection is untouched then.
    pub async fn remove(&self, id: &str) -> EngineResult<()> {
        let _in_flight = InFlight::start(&self.state);
        self.authorizer
            .send(ApiRequest::delete(self.kind.record_path(id)))
            .await
            .map_err(|e| self.record(e))?;

        self.state.send_modify(|state| {
            state.collection.remove(id);
            if state.current.as_ref().is_some_and(|record| record.id() == id) {
                state.current = None;
            }
        });
        info!(kind = %self.kind, %id, "record deleted");
        Ok(())
    }

    /// Drops all cached data.
    pub fn clear(&self) {
        self.state.send_modify(ResourceState::reset);
    }

    async fn load_one(&self, id: &str) -> EngineResult<ResourceRecord> {
        let payload = self
            .authorizer
            .send_json(ApiRequest::get(self.kind.record_path(id)))
            .await?;
        Ok(ResourceRecord::from_server(self.kind, payload)?)
    }

    async fn upload(&self, id: &str, attachment: Attachment) -> EngineResult<()> {
        debug!(kind = %self.kind, %id, ?attachment, "uploading attachment");
        self.authorizer
            .send(ApiRequest::post(self.kind.attachment_path(id)).multipart(ATTACHMENT_FIELD, attachment))
            .await
            .map(drop)
    }

    async fn attach_and_reload(
        &self,
        id: &str,
        attachment: Attachment,
    ) -> EngineResult<ResourceRecord> {
        self.upload(id, attachment).await?;
        self.load_one(id).await
    }

    fn normalize_list(&self, payload: Value) -> Vec<ResourceRecord> {
        let Value::Array(items) = payload else {
            warn!(kind = %self.kind, "collection payload is not a list, treating as empty");
            return Vec::new();
        };
        items
            .into_iter()
            .filter_map(|item| match ResourceRecord::from_server(self.kind, item) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(kind = %self.kind, error = %e, "skipping record");
                    None
                }
            })
            .collect()
    }

    fn check_attachment(&self, attachment: Option<&Attachment>) -> EngineResult<()> {
        if attachment.is_some() && !self.kind.supports_attachment() {
            return Err(self.record(DomainError::AttachmentNotSupported(self.kind.label()).into()));
        }
        Ok(())
    }

    fn partial_failure(&self, id: &str, cause: &EngineError) -> EngineError {
        EngineError::PartialFailure {
            kind: self.kind,
            id: id.to_string(),
            message: cause.to_string(),
        }
    }

    /// Records an error on the store state and hands it back.
    fn record(&self, error: EngineError) -> EngineError {
        let message = error.to_string();
        self.state.send_modify(|state| state.error = Some(message));
        error
    }
}
