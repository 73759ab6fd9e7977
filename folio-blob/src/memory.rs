use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::store::{locator_for, name_from_locator};
use crate::{BlobError, BlobResult, BlobStore};

/// In-memory blob store with the same contract as the filesystem store.
#[derive(Debug, Clone)]
pub struct MemoryBlobStore {
    base_url: String,
    blobs: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemoryBlobStore {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            blobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored blobs
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    pub fn contains(&self, locator: &str) -> bool {
        name_from_locator(locator)
            .map(|name| self.blobs.read().contains_key(name))
            .unwrap_or(false)
    }

    /// Stored names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.blobs.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new("memory://blobs")
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn save(&self, name: &str, data: Bytes) -> BlobResult<String> {
        if name_from_locator(name)? != name {
            return Err(BlobError::invalid(format!(
                "blob name must be a single path segment: {:?}",
                name
            )));
        }

        let mut blobs = self.blobs.write();
        if blobs.contains_key(name) {
            return Err(BlobError::AlreadyExists {
                name: name.to_string(),
            });
        }
        blobs.insert(name.to_string(), data);

        Ok(locator_for(&self.base_url, name))
    }

    async fn get(&self, locator: &str) -> BlobResult<Bytes> {
        let name = name_from_locator(locator)?;
        self.blobs
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| BlobError::not_found(locator))
    }

    async fn delete(&self, locator: &str) -> BlobResult<()> {
        let name = name_from_locator(locator)?;
        self.blobs.write().remove(name);
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}
