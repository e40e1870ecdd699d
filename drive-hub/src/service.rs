//! Synchronization operations against the remote store.
//!
//! [`FileService`] is the long-lived entry point shared by every caller. It
//! owns the document cache and the discover-or-create state (application
//! folder id, reserved app-settings file), both resolved lazily at most once
//! per service instance.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use futures::future::join_all;
use serde_json::Value;
use tokio::sync::OnceCell;
use tokio_stream::Stream;
use tracing::{debug, info, warn};

use crate::cache::DocumentCache;
use crate::document::{ContentError, Document, DocumentContent};
use crate::events::{FileAction, FileAlertEvent};
use crate::multipart::MultipartBody;
use crate::remote::{
    FileMetadata, ListQuery, RemoteEntry, RemoteStore, StoreError, FOLDER_MIME_TYPE,
    JSON_MIME_TYPE,
};

/// Default name of the application folder in the remote store.
pub const DEFAULT_FOLDER_NAME: &str = "FileManager";
/// Reserved name of the application settings document.
pub const APP_SETTINGS_FILE_NAME: &str = "file_manager_settings.json";

pub struct FileService {
    store: Arc<dyn RemoteStore>,
    cache: Arc<DocumentCache>,
    folder_name: String,
    app_file_name: String,
    folder_id: OnceCell<String>,
    app_file: OnceCell<Document>,
}

impl FileService {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self::with_names(store, DEFAULT_FOLDER_NAME, APP_SETTINGS_FILE_NAME)
    }

    pub fn with_names(store: Arc<dyn RemoteStore>, folder_name: &str, app_file_name: &str) -> Self {
        Self {
            store,
            cache: Arc::new(DocumentCache::new()),
            folder_name: folder_name.to_string(),
            app_file_name: app_file_name.to_string(),
            folder_id: OnceCell::new(),
            app_file: OnceCell::new(),
        }
    }

    /// The shared cache behind this service.
    pub fn cache(&self) -> &Arc<DocumentCache> {
        &self.cache
    }

    /// Per-document stream; see [`DocumentCache::listen_document_by_id`].
    pub fn listen_document_by_id(
        &self,
        id: &str,
    ) -> impl Stream<Item = FileAlertEvent> + Send + 'static {
        self.cache.listen_document_by_id(id)
    }

    /// Aggregate list stream; see [`DocumentCache::listen_documents`].
    pub fn listen_documents(&self) -> impl Stream<Item = Vec<Document>> + Send + 'static {
        self.cache.listen_documents()
    }

    /// Raw life-cycle event stream; see [`DocumentCache::listen_document_load`].
    pub fn listen_document_load(&self) -> impl Stream<Item = FileAlertEvent> + Send + 'static {
        self.cache.listen_document_load()
    }

    /// Pure remote query: build a Document for `id` without touching the
    /// cache or publishing anything.
    ///
    /// A document the store reports as non-downloadable fails the call;
    /// missing documents, denied content access and unparseable payloads are
    /// recovered into an error-content document instead.
    pub async fn fetch_by_id(&self, id: &str) -> Result<Document> {
        let metadata = match self.store.get_metadata(id).await {
            Ok(metadata) => metadata,
            Err(StoreError::NotFound(_)) => return Ok(Document::not_found(id)),
            Err(StoreError::PermissionDenied(_)) => {
                return Ok(Document::new(
                    id,
                    String::new(),
                    false,
                    None,
                    DocumentContent::Error(ContentError::permission_denied(id)),
                ))
            }
            Err(err) => return Err(anyhow!("fetching metadata for {} failed: {}", id, err)),
        };

        if !metadata.capabilities.can_download {
            return Err(anyhow!("document {} cannot be downloaded", id));
        }
        let editable =
            metadata.capabilities.can_rename && metadata.capabilities.can_modify_content;

        let content = match self.store.get_content(id).await {
            Ok(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(value) => DocumentContent::Json(value),
                Err(err) => {
                    warn!("content of {} is not valid JSON: {}", id, err);
                    DocumentContent::Error(ContentError::invalid_format(&err.to_string()))
                }
            },
            Err(StoreError::NotFound(_)) => DocumentContent::Error(ContentError::not_found(id)),
            Err(StoreError::PermissionDenied(_)) => {
                DocumentContent::Error(ContentError::permission_denied(id))
            }
            Err(err) => return Err(anyhow!("fetching content for {} failed: {}", id, err)),
        };

        Ok(Document::new(
            id,
            metadata.name,
            editable,
            metadata.modified_time,
            content,
        ))
    }

    /// Fetch `id` and publish a `Load` event with the result, error content
    /// included. Completes only after publication.
    ///
    /// Concurrent loads for the same id are allowed to race; the load whose
    /// fetch finishes last publishes last and wins in the cache.
    pub async fn load_by_id(&self, id: &str) -> Result<Document> {
        let document = self.fetch_by_id(id).await?;
        debug!("loaded {} ({})", id, document.name());
        self.cache
            .publish(FileAlertEvent::new(FileAction::Load, document.clone()));
        Ok(document)
    }

    /// Publish `Unload` for a cached id. Returns false, publishing nothing,
    /// when the id is empty or not cached.
    pub fn unload_by_id(&self, id: &str) -> bool {
        if id.is_empty() {
            return false;
        }
        match self.cache.get(id) {
            Some(document) => {
                self.cache
                    .publish(FileAlertEvent::new(FileAction::Unload, document));
                true
            }
            None => false,
        }
    }

    pub fn unload_file(&self, file: &Document) -> bool {
        self.unload_by_id(file.id())
    }

    /// Unload every cached document.
    pub fn clear_all_documents(&self) {
        for document in self.cache.documents() {
            self.cache
                .publish(FileAlertEvent::new(FileAction::Unload, document));
        }
    }

    /// List the documents currently accessible in the application folder.
    pub async fn get_all_accessible_files(&self) -> Result<Vec<RemoteEntry>> {
        let folder_id = self.get_folder_id().await?;
        let query = ListQuery::new()
            .mime_type(JSON_MIME_TYPE)
            .parent(&folder_id);
        Ok(self.store.list(&query).await?)
    }

    /// Load every accessible document. Each load is attempted independently;
    /// failures are absorbed into the aggregate verdict, which is true only
    /// when every round trip succeeded.
    pub async fn load_all_accessible_files(&self) -> bool {
        let entries = match self.get_all_accessible_files().await {
            Ok(entries) => entries,
            Err(err) => {
                warn!("listing accessible files failed: {}", err);
                return false;
            }
        };
        let loads = entries.iter().map(|entry| self.load_by_id(&entry.id));
        let mut all_loaded = true;
        for (entry, result) in entries.iter().zip(join_all(loads).await) {
            if let Err(err) = result {
                warn!("loading {} failed: {}", entry.id, err);
                all_loaded = false;
            }
        }
        all_loaded
    }

    /// Save a document's content. Without pending changes this is a local
    /// no-op returning the input unchanged; otherwise metadata and full
    /// current content go out as one multipart PATCH and a `Save` event
    /// publishes the new generation (baseline caught up to content).
    pub async fn save_json_file(&self, document: &Document) -> Result<Document> {
        let Some(changes) = document.pending_changes() else {
            debug!("save of {} skipped: no pending changes", document.id());
            return Ok(document.clone());
        };
        let metadata = FileMetadata::json_file(document.name());
        let body = MultipartBody::new(metadata, serde_json::to_string(changes)?)?;
        self.store.patch(document.id(), &body).await?;

        let mut saved = document.clone();
        saved.mark_saved();
        debug!("saved {} ({})", saved.id(), saved.name());
        self.cache
            .publish(FileAlertEvent::new(FileAction::Save, saved.clone()));
        Ok(saved)
    }

    /// Patch name and MIME type remotely without touching content.
    ///
    /// Publishes no cache event: the rename becomes visible locally on the
    /// next load or content save.
    pub async fn save_json_file_metadata(&self, document: &Document) -> Result<()> {
        let metadata = FileMetadata::json_file(document.name());
        self.store.patch_metadata(document.id(), &metadata).await?;
        debug!("saved metadata of {} ({})", document.id(), document.name());
        Ok(())
    }

    /// Create a new document in the application folder, adopt the
    /// store-assigned id and timestamp, and publish a `Save` event for it.
    pub async fn create_and_save_new_json_file(
        &self,
        name: &str,
        content: Value,
    ) -> Result<Document> {
        let folder_id = self.get_folder_id().await?;
        let metadata = FileMetadata::json_file_in(name, &folder_id);
        let body = MultipartBody::new(metadata, serde_json::to_string(&content)?)?;
        let created = self.store.create(&body).await?;
        info!("created {} ({})", name, created.id);

        let document = Document::new(
            created.id,
            name,
            true,
            created.modified_time,
            DocumentContent::Json(content),
        );
        self.cache
            .publish(FileAlertEvent::new(FileAction::Save, document.clone()));
        Ok(document)
    }

    /// Id of the application folder, discovered or created on first use and
    /// cached for the lifetime of this service.
    pub async fn get_folder_id(&self) -> Result<String> {
        let id = self
            .folder_id
            .get_or_try_init(|| self.resolve_folder_id())
            .await?;
        Ok(id.clone())
    }

    async fn resolve_folder_id(&self) -> Result<String> {
        let query = ListQuery::new()
            .mime_type(FOLDER_MIME_TYPE)
            .name(&self.folder_name);
        let existing = self.store.list(&query).await?;
        if let Some(entry) = existing.first() {
            debug!("using existing folder {} ({})", self.folder_name, entry.id);
            return Ok(entry.id.clone());
        }
        let created = self
            .store
            .create_metadata(&FileMetadata::folder(&self.folder_name))
            .await?;
        info!("created folder {} ({})", self.folder_name, created.id);
        Ok(created.id)
    }

    /// Discover-or-create an application data file by name inside the
    /// application folder, then fetch it. Publishes nothing.
    pub async fn get_app_data_by_name(&self, name: &str) -> Result<Document> {
        let folder_id = self.get_folder_id().await?;
        let query = ListQuery::new()
            .mime_type(JSON_MIME_TYPE)
            .name(name)
            .parent(&folder_id);
        let existing = self.store.list(&query).await?;
        let id = match existing.first() {
            Some(entry) => entry.id.clone(),
            None => {
                let metadata = FileMetadata::json_file_in(name, &folder_id);
                let body = MultipartBody::new(metadata, "{}")?;
                let created = self.store.create(&body).await?;
                info!("created app data file {} ({})", name, created.id);
                created.id
            }
        };
        self.fetch_by_id(&id).await
    }

    /// The reserved app-settings document, resolved at most once per
    /// service instance.
    pub async fn get_file_manager_app_file(&self) -> Result<Document> {
        let file = self
            .app_file
            .get_or_try_init(|| self.get_app_data_by_name(&self.app_file_name))
            .await?;
        Ok(file.clone())
    }
}
