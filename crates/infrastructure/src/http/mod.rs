//! HTTP helpers outside the transport itself.

mod attachment;

pub use attachment::{AttachmentError, load_attachment};
