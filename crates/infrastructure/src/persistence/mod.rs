//! Durable local storage.

mod credential_store;
mod file_system;

pub use credential_store::{CREDENTIALS_FILE, FileCredentialStore, default_path};
pub use file_system::TokioFileSystem;
