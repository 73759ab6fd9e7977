use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::{BlobError, BlobResult};

/// Core blob storage operations - implemented by every storage backend.
///
/// Stores hand out opaque locators from [`BlobStore::save`]; callers keep the
/// locator and pass it back unchanged to `get` / `delete`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `name` and return its locator.
    ///
    /// Never overwrites: an existing blob with the same name fails the save
    /// with [`BlobError::AlreadyExists`].
    async fn save(&self, name: &str, data: Bytes) -> BlobResult<String>;

    /// Read a blob back in full
    async fn get(&self, locator: &str) -> BlobResult<Bytes>;

    /// Delete a blob. A blob that is already gone is not an error.
    async fn delete(&self, locator: &str) -> BlobResult<()>;

    /// Short backend name for logs
    fn kind(&self) -> &'static str;
}

/// Strategy for generating storage names
pub trait BlobKeyStrategy: Send + Sync {
    /// Storage name for a freshly uploaded file called `file_name`.
    fn object_key(&self, file_name: &str) -> String;
}

/// Default key strategy: `{utc timestamp}_{random token}_{sanitized name}`
#[derive(Debug, Clone, Default)]
pub struct DefaultKeyStrategy;

impl BlobKeyStrategy for DefaultKeyStrategy {
    fn object_key(&self, file_name: &str) -> String {
        let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
        let token = Uuid::new_v4().simple().to_string();
        format!("{}_{}_{}", stamp, &token[..16], sanitize_file_name(file_name))
    }
}

const MAX_NAME_LEN: usize = 128;

/// Reduce an uploader-supplied name to a single safe path segment.
pub fn sanitize_file_name(file_name: &str) -> String {
    let last = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let mut out: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = out.trim_start_matches('.').len();
    out = out.split_off(out.len() - trimmed);
    out.truncate(MAX_NAME_LEN);

    if out.is_empty() {
        "file".to_string()
    } else {
        out
    }
}

/// Build the locator for a stored name.
pub fn locator_for(base_url: &str, name: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), name)
}

/// Recover the stored name: the final path segment of the locator.
pub fn name_from_locator(locator: &str) -> BlobResult<&str> {
    let name = locator.rsplit('/').next().unwrap_or_default();

    if name.is_empty() || name == "." || name == ".." {
        return Err(BlobError::invalid(format!(
            "locator has no usable final segment: {:?}",
            locator
        )));
    }
    if name.contains('\\') || name.contains('\0') {
        return Err(BlobError::invalid(format!(
            "locator segment contains forbidden characters: {:?}",
            locator
        )));
    }

    Ok(name)
}
