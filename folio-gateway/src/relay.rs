use std::sync::Arc;

use anyhow::Context;
use bytes::BytesMut;
use folio_core::FolioError;
use folio_media::{FileMetadata, MediaError, MediaFile, MediaService, UploadFrame};
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::multipart::SpooledFile;

fn media_error(err: MediaError) -> anyhow::Error {
    FolioError::from(err).into_anyhow()
}

/// Stream a spooled file to the media service as one upload session:
/// a metadata frame, chunk frames of at most `chunk_bytes`, then
/// end-of-stream. Returns the service's single response.
pub async fn relay_upload(
    service: &Arc<MediaService>,
    metadata: FileMetadata,
    file: &SpooledFile,
    chunk_bytes: usize,
) -> anyhow::Result<MediaFile> {
    let mut source = tokio::fs::File::open(file.path())
        .await
        .context("failed to open spooled upload")?;

    let mut upload = service.open_upload();
    upload.send(UploadFrame::metadata(metadata)).await.map_err(media_error)?;

    let chunk_bytes = chunk_bytes.max(1);
    let mut frames = 0usize;
    loop {
        let mut buf = BytesMut::with_capacity(chunk_bytes);
        while buf.len() < chunk_bytes {
            if source
                .read_buf(&mut buf)
                .await
                .context("failed to read spooled upload")?
                == 0
            {
                break;
            }
        }
        if buf.is_empty() {
            break;
        }

        upload.send(UploadFrame::Chunk(buf.freeze())).await.map_err(media_error)?;
        frames += 1;
    }

    debug!(frames, size = file.size(), "upload relayed");
    upload.close_and_recv().await.map_err(media_error)
}
