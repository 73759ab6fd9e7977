//! # folio-blob: byte storage for the media pipeline
//!
//! `folio-blob` stores whole files under generated names and hands back an
//! opaque locator (`{base_url}/{name}`). It knows nothing about media
//! records, users or HTTP; the media service embeds it.
//!
//! ```text
//! ┌─────────────────┐
//! │  MediaLifecycle │  ← records, compensation
//! ├─────────────────┤
//! │ BlobKeyStrategy │  ← unique storage names
//! ├─────────────────┤
//! │   BlobStore     │  ← save / get / delete
//! └─────────────────┘
//! ```
//!
//! ```rust
//! use folio_blob::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> BlobResult<()> {
//! let store = MemoryBlobStore::new("http://localhost:8080/files");
//! let name = DefaultKeyStrategy.object_key("hello.txt");
//!
//! let locator = store.save(&name, bytes::Bytes::from_static(b"hello")).await?;
//! assert_eq!(&store.get(&locator).await?[..], b"hello");
//!
//! store.delete(&locator).await?;
//! store.delete(&locator).await?; // already gone: still Ok
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod local;
mod memory;
pub mod store;

use std::sync::Arc;

pub use config::{BlobConfig, StorageBackend};
pub use error::{BlobError, BlobResult};
pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;
pub use store::{BlobKeyStrategy, BlobStore, DefaultKeyStrategy};

/// Build the store selected by `config.backend`.
pub fn open_store(config: &BlobConfig) -> Arc<dyn BlobStore> {
    match config.backend {
        StorageBackend::Local => Arc::new(LocalBlobStore::from_config(config)),
        StorageBackend::Memory => Arc::new(MemoryBlobStore::new(config.base_url.clone())),
    }
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BlobConfig, BlobError, BlobKeyStrategy, BlobResult, BlobStore, DefaultKeyStrategy,
        LocalBlobStore, MemoryBlobStore,
    };
}
