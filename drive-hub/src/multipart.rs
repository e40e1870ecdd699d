//! Multipart/related bodies for combined metadata + content uploads.
//!
//! Save and create round trips send one request carrying both the metadata
//! document and the full content, separated by a boundary marker:
//!
//! ```text
//! \r\n--<boundary>\r\n
//! Content-Type: application/json\r\n\r\n
//! {"name":...,"mimeType":...}
//! \r\n--<boundary>\r\n
//! Content-Type: <document MIME type>\r\n\r\n
//! <raw content>
//! \r\n--<boundary>--
//! ```
//!
//! with the request header `Content-Type: multipart/related; boundary="..."`.

use anyhow::Result;
use uuid::Uuid;

use crate::remote::{FileMetadata, JSON_MIME_TYPE};

/// A rendered multipart request body. The content part always carries the
/// MIME type named in the metadata part.
#[derive(Clone, Debug)]
pub struct MultipartBody {
    boundary: String,
    metadata: FileMetadata,
    content: String,
    body: String,
}

impl MultipartBody {
    /// Build a body with a fresh random boundary.
    pub fn new(metadata: FileMetadata, content: impl Into<String>) -> Result<Self> {
        let boundary = Uuid::new_v4().simple().to_string();
        Self::with_boundary(metadata, content, &boundary)
    }

    /// Build a body with a caller-chosen boundary.
    pub fn with_boundary(
        metadata: FileMetadata,
        content: impl Into<String>,
        boundary: &str,
    ) -> Result<Self> {
        let content = content.into();
        let metadata_json = serde_json::to_string(&metadata)?;
        let body = format!(
            "\r\n--{b}\r\nContent-Type: {meta_mime}\r\n\r\n{metadata}\r\n--{b}\r\nContent-Type: {content_mime}\r\n\r\n{content}\r\n--{b}--",
            b = boundary,
            meta_mime = JSON_MIME_TYPE,
            metadata = metadata_json,
            content_mime = metadata.mime_type,
            content = content,
        );
        Ok(Self {
            boundary: boundary.to_string(),
            metadata,
            content,
            body,
        })
    }

    /// Value for the request's `Content-Type` header.
    pub fn header_value(&self) -> String {
        format!("multipart/related; boundary=\"{}\"", self.boundary)
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// The rendered wire body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The structured metadata part, for adapters that re-encode rather
    /// than forward the rendered body.
    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    /// The raw content part.
    pub fn content(&self) -> &str {
        &self.content
    }
}
