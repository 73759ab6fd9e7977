use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::store::{locator_for, name_from_locator};
use crate::{BlobConfig, BlobError, BlobResult, BlobStore};

/// Local file system blob store.
///
/// Every blob is one file directly under `root`; the locator is
/// `{base_url}/{name}`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    base_url: String,
}

impl LocalBlobStore {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(root: P, base_url: S) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &BlobConfig) -> Self {
        Self::new(config.root.clone(), config.base_url.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path a locator resolves to
    pub fn path_for(&self, locator: &str) -> BlobResult<PathBuf> {
        Ok(self.root.join(name_from_locator(locator)?))
    }
}

fn single_segment(name: &str) -> BlobResult<&str> {
    match name_from_locator(name) {
        Ok(segment) if segment == name => Ok(segment),
        Ok(_) => Err(BlobError::invalid(format!(
            "blob name must be a single path segment: {:?}",
            name
        ))),
        Err(e) => Err(e),
    }
}

async fn write_fully(file: &mut fs::File, data: &[u8]) -> std::io::Result<()> {
    file.write_all(data).await?;
    file.flush().await?;
    file.sync_all().await
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn save(&self, name: &str, data: Bytes) -> BlobResult<String> {
        let name = single_segment(name)?;

        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| BlobError::write(name, e))?;

        let path = self.root.join(name);
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(BlobError::AlreadyExists {
                    name: name.to_string(),
                })
            }
            Err(e) => return Err(BlobError::write(name, e)),
        };

        if let Err(e) = write_fully(&mut file, &data).await {
            drop(file);
            // A half-written file must not outlive the failed save
            if let Err(cleanup) = fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), error = %cleanup, "failed to remove partial blob");
            }
            return Err(BlobError::write(name, e));
        }

        tracing::debug!(path = %path.display(), bytes = data.len(), "blob saved");
        Ok(locator_for(&self.base_url, name))
    }

    async fn get(&self, locator: &str) -> BlobResult<Bytes> {
        let path = self.path_for(locator)?;

        let data = fs::read(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                BlobError::not_found(locator)
            } else {
                BlobError::read(locator, e)
            }
        })?;

        Ok(Bytes::from(data))
    }

    async fn delete(&self, locator: &str) -> BlobResult<()> {
        let path = self.path_for(locator)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "blob deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "blob already absent");
                Ok(())
            }
            Err(e) => Err(BlobError::delete(locator, e)),
        }
    }

    fn kind(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_root() -> PathBuf {
        std::env::temp_dir().join(format!("folio-blob-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn save_creates_root_and_round_trips() {
        let root = scratch_root();
        let store = LocalBlobStore::new(&root, "http://localhost:8080/files/");
        assert!(!root.exists());

        let locator = store.save("20240101_x_a.txt", Bytes::from_static(b"abc")).await.unwrap();

        assert_eq!(locator, "http://localhost:8080/files/20240101_x_a.txt");
        assert!(root.join("20240101_x_a.txt").exists());
        assert_eq!(store.get(&locator).await.unwrap(), Bytes::from_static(b"abc"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn save_refuses_to_overwrite() {
        let root = scratch_root();
        let store = LocalBlobStore::new(&root, "http://h/files");

        let locator = store.save("same.bin", Bytes::from_static(b"first")).await.unwrap();
        let err = store.save("same.bin", Bytes::from_static(b"second")).await.unwrap_err();

        assert!(matches!(err, BlobError::AlreadyExists { .. }));
        assert_eq!(store.get(&locator).await.unwrap(), Bytes::from_static(b"first"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn save_rejects_names_with_directories() {
        let store = LocalBlobStore::new(scratch_root(), "http://h/files");
        let err = store.save("../escape.txt", Bytes::from_static(b"x")).await.unwrap_err();
        assert!(matches!(err, BlobError::Invalid { .. }));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let root = scratch_root();
        let store = LocalBlobStore::new(&root, "http://h/files");

        let locator = store.save("gone.txt", Bytes::from_static(b"x")).await.unwrap();
        store.delete(&locator).await.unwrap();
        store.delete(&locator).await.unwrap();

        assert!(matches!(store.get(&locator).await, Err(BlobError::NotFound { .. })));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn write_failure_surfaces_as_write_error() {
        // A regular file where the root directory should be
        let blocker = scratch_root();
        std::fs::write(&blocker, b"not a directory").unwrap();
        let store = LocalBlobStore::new(&blocker, "http://h/files");

        let err = store.save("a.txt", Bytes::from_static(b"x")).await.unwrap_err();
        assert!(err.is_write_error());

        let _ = std::fs::remove_file(&blocker);
    }
}
