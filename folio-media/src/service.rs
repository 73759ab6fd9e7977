use std::sync::Arc;

use bytes::Bytes;
use futures_util::{pin_mut, Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, instrument, trace, warn};

use crate::session::{CompletedUpload, UploadSession};
use crate::stream::{frame_stream, UploadStream};
use crate::{MediaConfig, MediaError, MediaFile, MediaLifecycle, MediaPage, MediaResult, UploadFrame};

/// Receiver of upload sessions and entry point for media queries
pub struct MediaService {
    lifecycle: MediaLifecycle,
    config: MediaConfig,
}

impl MediaService {
    pub fn new(lifecycle: MediaLifecycle, config: MediaConfig) -> Self {
        Self { lifecycle, config }
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &MediaLifecycle {
        &self.lifecycle
    }

    /// Run one upload session over `frames` and return the stored record.
    ///
    /// Reassembly must finish within `upload_timeout`; storage is only
    /// touched once the whole payload has arrived.
    pub async fn upload_file<S>(&self, frames: S) -> MediaResult<MediaFile>
    where
        S: Stream<Item = MediaResult<UploadFrame>> + Send,
    {
        let deadline = Instant::now() + self.config.upload_timeout;
        let upload = self.receive(frames, deadline).await?;
        self.commit(upload).await
    }

    async fn receive<S>(&self, frames: S, deadline: Instant) -> MediaResult<CompletedUpload>
    where
        S: Stream<Item = MediaResult<UploadFrame>>,
    {
        let after = self.config.upload_timeout;
        tokio::time::timeout_at(deadline, self.reassemble(frames))
            .await
            .map_err(|_| MediaError::DeadlineExceeded { after })?
    }

    async fn reassemble<S>(&self, frames: S) -> MediaResult<CompletedUpload>
    where
        S: Stream<Item = MediaResult<UploadFrame>>,
    {
        pin_mut!(frames);
        let mut session = UploadSession::new(self.config.max_upload_bytes);

        while let Some(frame) = frames.next().await {
            let frame = frame?;
            trace!(kind = frame.kind(), bytes = frame.payload_len(), "upload frame");
            session.accept(frame)?;
        }

        debug!(bytes = session.received_bytes(), "upload stream finished");
        session.finish()
    }

    async fn commit(&self, upload: CompletedUpload) -> MediaResult<MediaFile> {
        let CompletedUpload { metadata, data } = upload;
        self.lifecycle
            .complete(&metadata.file_name, &metadata.file_type, metadata.uploaded_by, data)
            .await
    }

    /// Open an in-process upload session served by a spawned receiver task.
    ///
    /// Both ends share one deadline. The receiver only commits while the
    /// sender is still waiting for the answer, and a stored file whose
    /// answer can no longer be delivered is discarded again.
    pub fn open_upload(self: &Arc<Self>) -> UploadStream {
        let (frames_tx, frames_rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let (close_tx, close_rx) = oneshot::channel();
        let (response_tx, response_rx) = oneshot::channel();
        let after = self.config.upload_timeout;
        let deadline = Instant::now() + after;

        let service = Arc::clone(self);
        tokio::spawn(async move {
            let result = match service.receive(frame_stream(frames_rx, close_rx), deadline).await {
                Ok(upload) if response_tx.is_closed() => {
                    debug!(file_name = %upload.metadata.file_name, "sender left before commit, upload dropped");
                    return;
                }
                Ok(upload) => service.commit(upload).await,
                Err(err) => Err(err),
            };
            match &result {
                Err(err) if err.is_client_error() => debug!(error = %err, "upload session rejected"),
                Err(err) => warn!(error = %err, "upload session failed"),
                Ok(_) => {}
            }
            if let Err(Ok(file)) = response_tx.send(result) {
                warn!(id = file.id, "upload response undeliverable, discarding stored file");
                service.lifecycle.discard(&file).await;
            }
        });

        UploadStream::new(frames_tx, close_tx, response_rx, deadline, after)
    }

    #[instrument(skip(self))]
    pub async fn get_file(&self, id: i64) -> MediaResult<MediaFile> {
        self.lifecycle.get(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_file(&self, id: i64) -> MediaResult<()> {
        self.lifecycle.delete(id).await
    }

    #[instrument(skip(self))]
    pub async fn list_files(
        &self,
        page: i64,
        limit: i64,
        file_type: Option<&str>,
    ) -> MediaResult<MediaPage> {
        self.lifecycle.list(page, limit, file_type).await
    }

    #[instrument(skip(self))]
    pub async fn files_by_user(&self, uploader: i64, page: i64, limit: i64) -> MediaResult<MediaPage> {
        self.lifecycle.list_by_uploader(uploader, page, limit).await
    }

    #[instrument(skip(self))]
    pub async fn read_content(&self, id: i64) -> MediaResult<(MediaFile, Bytes)> {
        self.lifecycle.read_content(id).await
    }
}
