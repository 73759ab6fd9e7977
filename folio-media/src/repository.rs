use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{FileType, MediaFile, MediaResult, NewMediaFile, PageRequest};

/// Data access for media metadata records
#[async_trait]
pub trait MediaFileRepository: Send + Sync {
    /// Insert a record and return it with its assigned id
    async fn create(&self, file: NewMediaFile) -> MediaResult<MediaFile>;

    async fn get_by_id(&self, id: i64) -> MediaResult<Option<MediaFile>>;

    /// Remove a record. Removing an unknown id is not an error.
    async fn delete(&self, id: i64) -> MediaResult<()>;

    /// Newest first, optionally restricted to one file type.
    /// Returns the page and the total number of matching records.
    async fn list(
        &self,
        page: PageRequest,
        file_type: Option<FileType>,
    ) -> MediaResult<(Vec<MediaFile>, u64)>;

    /// Newest first, restricted to one uploader.
    async fn list_by_uploader(
        &self,
        uploader: i64,
        page: PageRequest,
    ) -> MediaResult<(Vec<MediaFile>, u64)>;
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    files: BTreeMap<i64, MediaFile>,
}

/// In-memory repository; ids start at 1 and are never reused.
#[derive(Debug, Clone, Default)]
pub struct MemoryMediaRepository {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryMediaRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.read().files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().files.is_empty()
    }

    fn page_where<F>(&self, page: PageRequest, keep: F) -> (Vec<MediaFile>, u64)
    where
        F: Fn(&MediaFile) -> bool,
    {
        let state = self.state.read();
        let mut matching: Vec<&MediaFile> = state.files.values().filter(|f| keep(f)).collect();
        matching.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let files = matching
            .into_iter()
            .skip(page.offset())
            .take(page.limit as usize)
            .cloned()
            .collect();

        (files, total)
    }
}

#[async_trait]
impl MediaFileRepository for MemoryMediaRepository {
    async fn create(&self, file: NewMediaFile) -> MediaResult<MediaFile> {
        let mut state = self.state.write();
        state.next_id += 1;
        let record = file.with_id(state.next_id);
        state.files.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: i64) -> MediaResult<Option<MediaFile>> {
        Ok(self.state.read().files.get(&id).cloned())
    }

    async fn delete(&self, id: i64) -> MediaResult<()> {
        self.state.write().files.remove(&id);
        Ok(())
    }

    async fn list(
        &self,
        page: PageRequest,
        file_type: Option<FileType>,
    ) -> MediaResult<(Vec<MediaFile>, u64)> {
        Ok(self.page_where(page, |f| file_type.map_or(true, |t| f.file_type == t)))
    }

    async fn list_by_uploader(
        &self,
        uploader: i64,
        page: PageRequest,
    ) -> MediaResult<(Vec<MediaFile>, u64)> {
        Ok(self.page_where(page, |f| f.uploaded_by == Some(uploader)))
    }
}
