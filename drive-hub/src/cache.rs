//! Event-sourced projection of the document cache.
//!
//! The event history is authoritative; the snapshot is derived by folding
//! every published event in order through [`fold_event`]. Readers observe
//! the cache through streams that start from the current snapshot and then
//! follow the bus, so late subscribers never replay history.

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::document::Document;
use crate::events::{EventBus, FileAction, FileAlertEvent};

/// Fold one life-cycle event into a snapshot.
///
/// Pure and order-dependent: replaying the same sequence over an empty map
/// always yields the same snapshot. `Load`/`Save`/`Update` upsert the
/// document, `Unload`/`Error` remove its entry, and the file-less bootstrap
/// sentinel changes nothing.
pub fn fold_event(snapshot: &mut HashMap<String, Document>, event: &FileAlertEvent) {
    let Some(file) = &event.file else {
        return;
    };
    match event.action {
        FileAction::Load | FileAction::Save | FileAction::Update => {
            snapshot.insert(file.id().to_string(), file.clone());
        }
        FileAction::Unload | FileAction::Error => {
            snapshot.remove(file.id());
        }
    }
}

/// Process-wide cache: the bus plus its continuously folded snapshot.
///
/// All mutation happens through [`DocumentCache::publish`]; no caller ever
/// writes to the snapshot directly.
pub struct DocumentCache {
    bus: EventBus,
    snapshot: RwLock<HashMap<String, Document>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        let mut snapshot = HashMap::new();
        fold_event(&mut snapshot, &FileAlertEvent::bootstrap());
        Self {
            bus: EventBus::new(),
            snapshot: RwLock::new(snapshot),
        }
    }

    /// Publish one event: fold it into the snapshot, then notify
    /// subscribers. The write lock spans both steps, so every subscriber
    /// sees events in publish order and the snapshot always equals the fold
    /// of the events delivered so far.
    pub fn publish(&self, event: FileAlertEvent) {
        let mut snapshot = self.snapshot.write();
        fold_event(&mut snapshot, &event);
        self.bus.send(event);
    }

    pub fn get(&self, id: &str) -> Option<Document> {
        self.snapshot.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.snapshot.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.snapshot.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.read().is_empty()
    }

    /// All currently cached documents, ordered by id.
    pub fn documents(&self) -> Vec<Document> {
        Self::collect(&self.snapshot.read())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FileAlertEvent> {
        self.bus.subscribe()
    }

    /// Every raw life-cycle event from this point on.
    pub fn listen_document_load(&self) -> impl Stream<Item = FileAlertEvent> + Send + 'static {
        BroadcastStream::new(self.bus.subscribe()).filter_map(|event| event.ok())
    }

    /// The full cached list: once on subscription, then again after every
    /// published event that carries a file. The stream folds its own replica
    /// of the snapshot, so a dropped or slow reader never blocks the cache.
    pub fn listen_documents(&self) -> impl Stream<Item = Vec<Document>> + Send + 'static {
        let (mut replica, rx) = {
            let snapshot = self.snapshot.read();
            ((*snapshot).clone(), self.bus.subscribe())
        };
        let initial = Self::collect(&replica);
        let updates = BroadcastStream::new(rx).filter_map(move |event| match event {
            Ok(event) if event.file.is_some() => {
                fold_event(&mut replica, &event);
                Some(Self::collect(&replica))
            }
            _ => None,
        });
        tokio_stream::once(initial).chain(updates)
    }

    /// Per-document stream: immediately emits the current state for `id`
    /// (a `Load` with the cached document, or a synthesized `Error` carrying
    /// a not-found placeholder), then every later event whose file matches
    /// the id, unfiltered by action. Stays open indefinitely.
    pub fn listen_document_by_id(
        &self,
        id: &str,
    ) -> impl Stream<Item = FileAlertEvent> + Send + 'static {
        let (current, rx) = {
            let snapshot = self.snapshot.read();
            let current = match snapshot.get(id) {
                Some(file) => FileAlertEvent::new(FileAction::Load, file.clone()),
                None => FileAlertEvent::new(FileAction::Error, Document::not_found(id)),
            };
            (current, self.bus.subscribe())
        };
        let id = id.to_string();
        let matching = BroadcastStream::new(rx).filter_map(move |event| match event {
            Ok(event) if event.file.as_ref().map(Document::id) == Some(id.as_str()) => Some(event),
            _ => None,
        });
        tokio_stream::once(current).chain(matching)
    }

    fn collect(snapshot: &HashMap<String, Document>) -> Vec<Document> {
        let mut documents: Vec<Document> = snapshot.values().cloned().collect();
        documents.sort_by(|a, b| a.id().cmp(b.id()));
        documents
    }
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::new()
    }
}
