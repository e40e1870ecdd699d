//! Documents mirrored from the remote drive.
//!
//! A [`Document`] carries two content generations: the `baseline` captured at
//! load/save time and the live-edited `current` value. The diff between them
//! decides whether a save has to hit the store at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error kind used when a document is absent locally or remotely.
pub const FILE_NOT_FOUND: &str = "File Not Found";
/// Error kind used when the remote payload is not valid JSON.
pub const INVALID_FILE_FORMAT: &str = "Invalid File Format";
/// Error kind used when the store refuses access to the content.
pub const PERMISSION_DENIED: &str = "Permission Denied";

/// Structured descriptor delivered in place of content when a document could
/// not be materialized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentError {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

impl ContentError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn not_found(id: &str) -> Self {
        Self::new(FILE_NOT_FOUND, format!("file {} could not be found", id))
    }

    pub fn permission_denied(id: &str) -> Self {
        Self::new(
            PERMISSION_DENIED,
            format!("access to file {} was denied", id),
        )
    }

    pub fn invalid_format(detail: &str) -> Self {
        Self::new(INVALID_FILE_FORMAT, detail.to_string())
    }
}

/// Parsed JSON payload, or the error descriptor delivered in its place.
#[derive(Clone, Debug, PartialEq)]
pub enum DocumentContent {
    Json(Value),
    Error(ContentError),
}

impl DocumentContent {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            DocumentContent::Json(value) => Some(value),
            DocumentContent::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ContentError> {
        match self {
            DocumentContent::Json(_) => None,
            DocumentContent::Error(err) => Some(err),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, DocumentContent::Error(_))
    }
}

/// One remote document's identity, metadata and content state.
///
/// At most one cache entry exists per id; the cache replaces entries
/// wholesale on publish rather than mutating them in place.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    id: String,
    name: String,
    editable: bool,
    modified_time: Option<DateTime<Utc>>,
    baseline: DocumentContent,
    current: DocumentContent,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        editable: bool,
        modified_time: Option<DateTime<Utc>>,
        content: DocumentContent,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            editable,
            modified_time,
            baseline: content.clone(),
            current: content,
        }
    }

    /// Placeholder for an id that has no cache entry. Carries a
    /// `File Not Found` descriptor so observers always receive a document
    /// they can render.
    pub fn not_found(id: &str) -> Self {
        Self::new(
            id,
            String::new(),
            false,
            None,
            DocumentContent::Error(ContentError::not_found(id)),
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn editable(&self) -> bool {
        self.editable
    }

    pub fn modified_time(&self) -> Option<DateTime<Utc>> {
        self.modified_time
    }

    /// The live-edited content generation.
    pub fn content(&self) -> &DocumentContent {
        &self.current
    }

    /// The content generation captured at load/save time.
    pub fn baseline(&self) -> &DocumentContent {
        &self.baseline
    }

    /// Replace the live content. The baseline is untouched, so the document
    /// becomes dirty unless the new value equals it.
    pub fn set_content(&mut self, value: Value) {
        self.current = DocumentContent::Json(value);
    }

    pub fn is_dirty(&self) -> bool {
        self.current != self.baseline
    }

    /// The current JSON value when it differs from the baseline. `None`
    /// means a save would be a no-op; error content is never saveable.
    pub fn pending_changes(&self) -> Option<&Value> {
        if self.current == self.baseline {
            return None;
        }
        self.current.as_json()
    }

    /// Promote the current content to the baseline after a successful save.
    pub fn mark_saved(&mut self) {
        self.baseline = self.current.clone();
    }
}
