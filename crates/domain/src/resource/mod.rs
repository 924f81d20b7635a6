//! Backend-owned resources cached on the client

mod attachment;
mod collection;
mod kind;
mod record;

pub use attachment::{ATTACHMENT_FIELD, Attachment};
pub use collection::ResourceCollection;
pub use kind::{CreatePolicy, DEFAULT_ARTWORK_STATUS, ResourceKind};
pub use record::{ORIGIN_FIELD, RecordOrigin, ResourceRecord};
