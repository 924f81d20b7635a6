//! Real file system implementation.

use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;

use artdesk_application::ports::{FileSystem, FileSystemError};

/// Real file system implementation using `tokio::fs`.
#[derive(Debug, Clone, Default)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    /// Creates a new `TokioFileSystem`.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn classify(path: &Path, error: std::io::Error) -> FileSystemError {
    match error.kind() {
        ErrorKind::NotFound => FileSystemError::NotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => FileSystemError::PermissionDenied(path.to_path_buf()),
        _ => FileSystemError::Io(error),
    }
}

impl FileSystem for TokioFileSystem {
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, FileSystemError> {
        fs::read(path).await.map_err(|e| classify(path, e))
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), FileSystemError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, contents).await.map_err(|e| classify(path, e))
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<(), FileSystemError> {
        fs::rename(from, to).await.map_err(|e| classify(from, e))
    }

    async fn remove_file(&self, path: &Path) -> Result<(), FileSystemError> {
        fs::remove_file(path).await.map_err(|e| classify(path, e))
    }
}
