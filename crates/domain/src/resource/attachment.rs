//! Binary attachments uploaded alongside records.

use std::fmt;

/// Multipart field name the backend expects for record images.
pub const ATTACHMENT_FIELD: &str = "image";

/// A single file to upload as a record's dependent sub-resource.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name sent with the multipart part.
    pub file_name: String,
    /// MIME type of the content.
    pub content_type: String,
    /// Raw content.
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// Creates an attachment, guessing the MIME type from the file name.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Overrides the guessed MIME type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the attachment has no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
