//! Boundary to the remote document store.
//!
//! The store's native client is an external collaborator; this module pins
//! down the surface the synchronization operations rely on, the wire-level
//! metadata types, and the error taxonomy adapters must map onto.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::multipart::MultipartBody;

/// MIME type of the documents managed by this layer. Shared between the
/// metadata and content parts of every multipart body.
pub const JSON_MIME_TYPE: &str = "application/json";
/// MIME type the store assigns to folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Failures surfaced by a store adapter.
///
/// `NotFound` and `PermissionDenied` are content-level conditions the
/// operations recover into an error-content document; `Transport` rejects
/// the operation that hit it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Query over the store's listing endpoint. Unset fields do not constrain
/// the result; trashed documents are excluded unless asked for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub mime_type: Option<String>,
    pub name: Option<String>,
    pub parent: Option<String>,
    pub include_trashed: bool,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mime_type(mut self, mime_type: &str) -> Self {
        self.mime_type = Some(mime_type.to_string());
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn include_trashed(mut self) -> Self {
        self.include_trashed = true;
        self
    }
}

/// One row of a listing response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub id: String,
    pub name: String,
}

/// Capability flags the store reports per document.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub can_download: bool,
    pub can_rename: bool,
    pub can_modify_content: bool,
}

/// Metadata half of a fetch.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMetadata {
    pub id: String,
    pub name: String,
    pub modified_time: Option<DateTime<Utc>>,
    pub capabilities: Capabilities,
}

/// Store-assigned identity returned by a create call.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedFile {
    pub id: String,
    pub modified_time: Option<DateTime<Utc>>,
}

/// Metadata document sent on create and patch calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parents: Option<Vec<String>>,
}

impl FileMetadata {
    pub fn json_file(name: &str) -> Self {
        Self {
            name: name.to_string(),
            mime_type: JSON_MIME_TYPE.to_string(),
            parents: None,
        }
    }

    pub fn json_file_in(name: &str, parent: &str) -> Self {
        Self {
            name: name.to_string(),
            mime_type: JSON_MIME_TYPE.to_string(),
            parents: Some(vec![parent.to_string()]),
        }
    }

    pub fn folder(name: &str) -> Self {
        Self {
            name: name.to_string(),
            mime_type: FOLDER_MIME_TYPE.to_string(),
            parents: None,
        }
    }
}

/// The remote store surface the synchronization operations are written
/// against. Adapters translate these calls onto the store's native client.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Query documents by MIME type, name, parent folder and trashed flag.
    async fn list(&self, query: &ListQuery) -> Result<Vec<RemoteEntry>, StoreError>;

    /// Fetch a document's metadata, including its capability flags.
    async fn get_metadata(&self, id: &str) -> Result<RemoteMetadata, StoreError>;

    /// Fetch a document's raw content as text.
    async fn get_content(&self, id: &str) -> Result<String, StoreError>;

    /// Create a document from metadata alone (folders).
    async fn create_metadata(&self, metadata: &FileMetadata) -> Result<CreatedFile, StoreError>;

    /// Create a document from a combined metadata + content body.
    async fn create(&self, body: &MultipartBody) -> Result<CreatedFile, StoreError>;

    /// Replace a document's metadata and content in one call.
    async fn patch(&self, id: &str, body: &MultipartBody) -> Result<(), StoreError>;

    /// Patch metadata only; the content is untouched.
    async fn patch_metadata(&self, id: &str, metadata: &FileMetadata) -> Result<(), StoreError>;
}
