//! Life-cycle events and the multicast bus carrying them.
//!
//! Every cache mutation flows through exactly one [`FileAlertEvent`]; the
//! bus itself never performs I/O.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::document::Document;

const CHANNEL_CAPACITY: usize = 100;

/// One discrete transition applied to a document's cache membership.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    Load,
    Unload,
    Error,
    Update,
    Save,
}

/// A life-cycle event on the bus. `file` is `None` only for the bootstrap
/// sentinel.
#[derive(Clone, Debug)]
pub struct FileAlertEvent {
    pub action: FileAction,
    pub file: Option<Document>,
}

impl FileAlertEvent {
    pub fn new(action: FileAction, file: Document) -> Self {
        Self {
            action,
            file: Some(file),
        }
    }

    /// Sentinel seeding the fold so the stream is never empty for a new
    /// subscriber. A no-op in the reducer.
    pub fn bootstrap() -> Self {
        Self {
            action: FileAction::Error,
            file: None,
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<FileAlertEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FileAlertEvent> {
        self.tx.subscribe()
    }

    pub fn send(&self, event: FileAlertEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
