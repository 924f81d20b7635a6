//! Loading record attachments from disk.

use std::path::{Path, PathBuf};

use artdesk_application::ports::{FileSystem, FileSystemError};
use artdesk_domain::Attachment;

/// Error type for attachment loading.
#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    /// The file could not be read.
    #[error("Failed to read attachment {path}: {source}")]
    Read {
        /// Resolved file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: FileSystemError,
    },

    /// The file has no content.
    #[error("Attachment {0} is empty")]
    Empty(PathBuf),
}

/// Reads `path` into an [`Attachment`].
///
/// Relative paths resolve against `base` when one is given. The MIME type is
/// guessed from the file extension.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is empty.
pub async fn load_attachment<F: FileSystem>(
    fs: &F,
    path: &Path,
    base: Option<&Path>,
) -> Result<Attachment, AttachmentError> {
    let resolved = match base {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    };

    let bytes = fs
        .read_file(&resolved)
        .await
        .map_err(|source| AttachmentError::Read {
            path: resolved.clone(),
            source,
        })?;
    if bytes.is_empty() {
        return Err(AttachmentError::Empty(resolved));
    }

    let file_name = resolved
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("attachment")
        .to_string();
    Ok(Attachment::new(file_name, bytes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::persistence::TokioFileSystem;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_relative_path_resolves_against_base() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("dawn.png"), [137, 80, 78, 71]).unwrap();

        let attachment = load_attachment(&TokioFileSystem::new(), Path::new("dawn.png"), Some(dir.path()))
            .await
            .unwrap();

        assert_eq!(attachment.file_name, "dawn.png");
        assert_eq!(attachment.content_type, "image/png");
        assert_eq!(attachment.len(), 4);
    }

    #[tokio::test]
    async fn test_empty_and_missing_files_fail() {
        let dir = tempdir().unwrap();
        let empty = dir.path().join("empty.jpg");
        std::fs::write(&empty, []).unwrap();
        let fs = TokioFileSystem::new();

        assert!(matches!(
            load_attachment(&fs, &empty, None).await,
            Err(AttachmentError::Empty(_))
        ));
        assert!(matches!(
            load_attachment(&fs, &dir.path().join("missing.jpg"), None).await,
            Err(AttachmentError::Read {
                source: FileSystemError::NotFound(_),
                ..
            })
        ));
    }
}
