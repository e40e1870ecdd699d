//! In-memory remote store used by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::{sleep, Duration};

use drive_hub::multipart::MultipartBody;
use drive_hub::remote::{
    Capabilities, CreatedFile, FileMetadata, ListQuery, RemoteEntry, RemoteMetadata, RemoteStore,
    StoreError,
};
use drive_hub::service::FileService;

pub fn fixed_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).single().unwrap()
}

#[derive(Clone, Debug)]
pub struct StoredFile {
    pub name: String,
    pub mime_type: String,
    pub parent: Option<String>,
    pub content: String,
    pub can_download: bool,
    pub trashed: bool,
}

#[derive(Default)]
pub struct CallCounts {
    pub list: AtomicUsize,
    pub get_metadata: AtomicUsize,
    pub get_content: AtomicUsize,
    pub create_metadata: AtomicUsize,
    pub create: AtomicUsize,
    pub patch: AtomicUsize,
    pub patch_metadata: AtomicUsize,
}

impl CallCounts {
    pub fn writes(&self) -> usize {
        self.create.load(Ordering::SeqCst)
            + self.create_metadata.load(Ordering::SeqCst)
            + self.patch.load(Ordering::SeqCst)
            + self.patch_metadata.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.writes()
            + self.list.load(Ordering::SeqCst)
            + self.get_metadata.load(Ordering::SeqCst)
            + self.get_content.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct MockStore {
    files: Mutex<HashMap<String, StoredFile>>,
    next_id: AtomicUsize,
    pub calls: CallCounts,
    content_script: Mutex<VecDeque<(Duration, String)>>,
}

impl MockStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, id: &str, file: StoredFile) {
        self.files.lock().insert(id.to_string(), file);
    }

    pub fn put_json_file(&self, id: &str, name: &str, parent: Option<&str>, content: &Value) {
        self.insert(
            id,
            StoredFile {
                name: name.to_string(),
                mime_type: drive_hub::remote::JSON_MIME_TYPE.to_string(),
                parent: parent.map(str::to_string),
                content: content.to_string(),
                can_download: true,
                trashed: false,
            },
        );
    }

    pub fn put_raw_file(&self, id: &str, name: &str, parent: Option<&str>, content: &str) {
        self.insert(
            id,
            StoredFile {
                name: name.to_string(),
                mime_type: drive_hub::remote::JSON_MIME_TYPE.to_string(),
                parent: parent.map(str::to_string),
                content: content.to_string(),
                can_download: true,
                trashed: false,
            },
        );
    }

    pub fn put_folder(&self, id: &str, name: &str) {
        self.insert(
            id,
            StoredFile {
                name: name.to_string(),
                mime_type: drive_hub::remote::FOLDER_MIME_TYPE.to_string(),
                parent: None,
                content: String::new(),
                can_download: false,
                trashed: false,
            },
        );
    }

    pub fn deny_download(&self, id: &str) {
        if let Some(file) = self.files.lock().get_mut(id) {
            file.can_download = false;
        }
    }

    pub fn mark_trashed(&self, id: &str) {
        if let Some(file) = self.files.lock().get_mut(id) {
            file.trashed = true;
        }
    }

    pub fn stored_content(&self, id: &str) -> Option<String> {
        self.files.lock().get(id).map(|f| f.content.clone())
    }

    pub fn stored_name(&self, id: &str) -> Option<String> {
        self.files.lock().get(id).map(|f| f.name.clone())
    }

    pub fn stored_mime(&self, id: &str) -> Option<String> {
        self.files.lock().get(id).map(|f| f.mime_type.clone())
    }

    /// Queue a scripted `get_content` response: the next call sleeps for
    /// `delay`, then returns `content` regardless of the stored file.
    pub fn script_content(&self, delay: Duration, content: &Value) {
        self.content_script
            .lock()
            .push_back((delay, content.to_string()));
    }

    fn alloc_id(&self) -> String {
        format!("file-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl RemoteStore for MockStore {
    async fn list(&self, query: &ListQuery) -> Result<Vec<RemoteEntry>, StoreError> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        let files = self.files.lock();
        let mut entries: Vec<RemoteEntry> = files
            .iter()
            .filter(|(_, f)| query.mime_type.as_deref().map_or(true, |m| f.mime_type == m))
            .filter(|(_, f)| query.name.as_deref().map_or(true, |n| f.name == n))
            .filter(|(_, f)| {
                query
                    .parent
                    .as_deref()
                    .map_or(true, |p| f.parent.as_deref() == Some(p))
            })
            .filter(|(_, f)| query.include_trashed || !f.trashed)
            .map(|(id, f)| RemoteEntry {
                id: id.clone(),
                name: f.name.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(entries)
    }

    async fn get_metadata(&self, id: &str) -> Result<RemoteMetadata, StoreError> {
        self.calls.get_metadata.fetch_add(1, Ordering::SeqCst);
        let files = self.files.lock();
        let file = files
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(RemoteMetadata {
            id: id.to_string(),
            name: file.name.clone(),
            modified_time: Some(fixed_time()),
            capabilities: Capabilities {
                can_download: file.can_download,
                can_rename: true,
                can_modify_content: true,
            },
        })
    }

    async fn get_content(&self, id: &str) -> Result<String, StoreError> {
        self.calls.get_content.fetch_add(1, Ordering::SeqCst);
        let scripted = self.content_script.lock().pop_front();
        if let Some((delay, content)) = scripted {
            sleep(delay).await;
            return Ok(content);
        }
        let files = self.files.lock();
        files
            .get(id)
            .map(|f| f.content.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn create_metadata(&self, metadata: &FileMetadata) -> Result<CreatedFile, StoreError> {
        self.calls.create_metadata.fetch_add(1, Ordering::SeqCst);
        let id = self.alloc_id();
        self.insert(
            &id,
            StoredFile {
                name: metadata.name.clone(),
                mime_type: metadata.mime_type.clone(),
                parent: metadata.parents.as_ref().and_then(|p| p.first().cloned()),
                content: String::new(),
                can_download: false,
                trashed: false,
            },
        );
        Ok(CreatedFile {
            id,
            modified_time: Some(fixed_time()),
        })
    }

    async fn create(&self, body: &MultipartBody) -> Result<CreatedFile, StoreError> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        let metadata = body.metadata();
        let id = self.alloc_id();
        self.insert(
            &id,
            StoredFile {
                name: metadata.name.clone(),
                mime_type: metadata.mime_type.clone(),
                parent: metadata.parents.as_ref().and_then(|p| p.first().cloned()),
                content: body.content().to_string(),
                can_download: true,
                trashed: false,
            },
        );
        Ok(CreatedFile {
            id,
            modified_time: Some(fixed_time()),
        })
    }

    async fn patch(&self, id: &str, body: &MultipartBody) -> Result<(), StoreError> {
        self.calls.patch.fetch_add(1, Ordering::SeqCst);
        let mut files = self.files.lock();
        let file = files
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        file.name = body.metadata().name.clone();
        file.mime_type = body.metadata().mime_type.clone();
        file.content = body.content().to_string();
        Ok(())
    }

    async fn patch_metadata(&self, id: &str, metadata: &FileMetadata) -> Result<(), StoreError> {
        self.calls.patch_metadata.fetch_add(1, Ordering::SeqCst);
        let mut files = self.files.lock();
        let file = files
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        file.name = metadata.name.clone();
        file.mime_type = metadata.mime_type.clone();
        Ok(())
    }
}

pub fn setup() -> (Arc<MockStore>, FileService) {
    let store = MockStore::new();
    let service = FileService::new(store.clone());
    (store, service)
}
