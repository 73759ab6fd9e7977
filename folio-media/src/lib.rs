//! # folio-media: media records and the chunked upload protocol
//!
//! An upload is a stream of [`UploadFrame`]s: one metadata frame, then
//! chunk frames, then end-of-stream. [`MediaService`] reassembles the
//! stream under a byte ceiling and a deadline and hands the payload to
//! [`MediaLifecycle`], which writes the blob before the record and removes
//! the blob again if the record cannot be persisted.
//!
//! ```rust
//! use std::sync::Arc;
//! use folio_blob::MemoryBlobStore;
//! use folio_media::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> MediaResult<()> {
//! let lifecycle = MediaLifecycle::new(
//!     Arc::new(MemoryMediaRepository::new()),
//!     Arc::new(MemoryBlobStore::new("http://localhost:8080/files")),
//! );
//! let service = Arc::new(MediaService::new(lifecycle, MediaConfig::default()));
//!
//! let mut upload = service.open_upload();
//! upload.send(UploadFrame::metadata(FileMetadata::new("a.txt", "document"))).await?;
//! upload.send(UploadFrame::chunk(&b"abc"[..])).await?;
//! let file = upload.close_and_recv().await?;
//!
//! assert_eq!(file.file_size, 3);
//! # Ok(())
//! # }
//! ```

mod config;
mod entity;
mod error;
mod lifecycle;
mod protocol;
mod repository;
mod service;
mod session;
mod stream;

pub use config::MediaConfig;
pub use entity::{FileType, MediaFile, MediaPage, NewMediaFile, PageRequest, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
pub use error::{MediaError, MediaResult};
pub use lifecycle::MediaLifecycle;
pub use protocol::{FileMetadata, UploadFrame};
pub use repository::{MediaFileRepository, MemoryMediaRepository};
pub use service::MediaService;
pub use session::{CompletedUpload, UploadSession};
pub use stream::UploadStream;

pub mod prelude {
    pub use crate::{
        FileMetadata, FileType, MediaConfig, MediaError, MediaFile, MediaLifecycle, MediaPage,
        MediaResult, MediaService, MemoryMediaRepository, UploadFrame, UploadStream,
    };
}
