use std::sync::Arc;

use bytes::Bytes;
use folio_blob::{BlobKeyStrategy, BlobStore, DefaultKeyStrategy};
use tracing::{debug, info, warn};

use crate::{
    FileType, MediaError, MediaFile, MediaFileRepository, MediaPage, MediaResult, NewMediaFile,
    PageRequest,
};

/// Creates, reads and removes media records together with their blobs.
///
/// A record exists only if its blob was written first; a blob written for a
/// record that could not be persisted is deleted again.
pub struct MediaLifecycle {
    repo: Arc<dyn MediaFileRepository>,
    store: Arc<dyn BlobStore>,
    keys: Arc<dyn BlobKeyStrategy>,
}

impl MediaLifecycle {
    pub fn new(repo: Arc<dyn MediaFileRepository>, store: Arc<dyn BlobStore>) -> Self {
        Self {
            repo,
            store,
            keys: Arc::new(DefaultKeyStrategy),
        }
    }

    pub fn with_key_strategy<K>(mut self, keys: K) -> Self
    where
        K: BlobKeyStrategy + 'static,
    {
        self.keys = Arc::new(keys);
        self
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    pub fn repository(&self) -> &Arc<dyn MediaFileRepository> {
        &self.repo
    }

    /// Store `data` and record it.
    pub async fn complete(
        &self,
        file_name: &str,
        file_type: &str,
        uploaded_by: Option<i64>,
        data: Bytes,
    ) -> MediaResult<MediaFile> {
        let file_type: FileType = file_type.parse()?;
        let file_size = data.len() as u64;
        let name = self.keys.object_key(file_name);

        let locator = self
            .store
            .save(&name, data)
            .await
            .map_err(|source| MediaError::UploadFailed { source })?;
        debug!(%locator, file_size, "blob stored");

        let record = NewMediaFile::new(file_name, locator.clone(), file_type, uploaded_by, file_size);
        match self.repo.create(record).await {
            Ok(file) => {
                info!(id = file.id, file_name, %file_type, file_size, "media file created");
                Ok(file)
            }
            Err(err) => {
                if let Err(cleanup) = self.store.delete(&locator).await {
                    warn!(%locator, error = %cleanup, "failed to remove orphaned blob");
                }
                Err(err)
            }
        }
    }

    /// Undo a [`complete`](Self::complete) whose result never reached the
    /// caller: the record goes first, then the blob. If the record cannot be
    /// removed the blob is kept so the record still resolves.
    pub async fn discard(&self, file: &MediaFile) {
        if let Err(err) = self.repo.delete(file.id).await {
            warn!(id = file.id, error = %err, "failed to discard undelivered media record");
            return;
        }
        if let Err(err) = self.store.delete(&file.file_url).await {
            warn!(id = file.id, locator = %file.file_url, error = %err, "failed to discard undelivered blob");
            return;
        }
        info!(id = file.id, locator = %file.file_url, "undelivered media file discarded");
    }

    pub async fn get(&self, id: i64) -> MediaResult<MediaFile> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(MediaError::FileNotFound { id })
    }

    /// Remove the blob, then the record. A failed blob delete keeps the record.
    pub async fn delete(&self, id: i64) -> MediaResult<()> {
        let file = self.get(id).await?;

        self.store
            .delete(&file.file_url)
            .await
            .map_err(|source| MediaError::Storage { source })?;
        self.repo.delete(id).await?;

        info!(id, locator = %file.file_url, "media file deleted");
        Ok(())
    }

    /// List records newest first. An empty filter means all types.
    pub async fn list(
        &self,
        page: i64,
        limit: i64,
        file_type: Option<&str>,
    ) -> MediaResult<MediaPage> {
        let filter = match file_type.map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<FileType>()?),
        };
        let request = PageRequest::new(page, limit);
        let (files, total) = self.repo.list(request, filter).await?;
        Ok(page_of(files, total, request))
    }

    pub async fn list_by_uploader(
        &self,
        uploader: i64,
        page: i64,
        limit: i64,
    ) -> MediaResult<MediaPage> {
        let request = PageRequest::new(page, limit);
        let (files, total) = self.repo.list_by_uploader(uploader, request).await?;
        Ok(page_of(files, total, request))
    }

    /// The record and its stored bytes
    pub async fn read_content(&self, id: i64) -> MediaResult<(MediaFile, Bytes)> {
        let file = self.get(id).await?;
        let data = self
            .store
            .get(&file.file_url)
            .await
            .map_err(|source| MediaError::Storage { source })?;
        Ok((file, data))
    }
}

fn page_of(files: Vec<MediaFile>, total: u64, request: PageRequest) -> MediaPage {
    MediaPage {
        files,
        total,
        page: request.page,
        limit: request.limit,
    }
}
