use std::time::Duration;

use futures_util::Stream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::{MediaError, MediaFile, MediaResult, UploadFrame};

/// Sender half of an in-process upload session.
///
/// Frames go out over a bounded channel, so `send` waits whenever the
/// receiver falls behind. [`UploadStream::close_and_recv`] marks
/// end-of-stream and returns the single aggregated response, or
/// `DeadlineExceeded` once the session deadline passes. Dropping the stream
/// without closing it aborts the session.
#[derive(Debug)]
pub struct UploadStream {
    frames: Option<mpsc::Sender<UploadFrame>>,
    close: Option<oneshot::Sender<()>>,
    response: Option<oneshot::Receiver<MediaResult<MediaFile>>>,
    deadline: Instant,
    after: Duration,
}

impl UploadStream {
    pub(crate) fn new(
        frames: mpsc::Sender<UploadFrame>,
        close: oneshot::Sender<()>,
        response: oneshot::Receiver<MediaResult<MediaFile>>,
        deadline: Instant,
        after: Duration,
    ) -> Self {
        Self {
            frames: Some(frames),
            close: Some(close),
            response: Some(response),
            deadline,
            after,
        }
    }

    /// Send one frame.
    ///
    /// If the receiver has already given up on the session, the error it
    /// answered with is returned instead of a generic send failure.
    pub async fn send(&mut self, frame: UploadFrame) -> MediaResult<()> {
        let sender = self
            .frames
            .as_ref()
            .ok_or_else(|| MediaError::protocol("upload stream is already closed"))?;

        if sender.send(frame).await.is_ok() {
            return Ok(());
        }

        self.frames = None;
        self.close = None;
        match self.response().await {
            Err(err) => Err(err),
            Ok(_) => Err(MediaError::aborted("receiver finished before end-of-stream")),
        }
    }

    /// Signal end-of-stream and wait for the aggregated response
    pub async fn close_and_recv(mut self) -> MediaResult<MediaFile> {
        if let Some(close) = self.close.take() {
            let _ = close.send(());
        }
        self.frames = None;
        self.response().await
    }

    async fn response(&mut self) -> MediaResult<MediaFile> {
        let rx = self
            .response
            .take()
            .ok_or_else(|| MediaError::protocol("upload response was already consumed"))?;

        // Dropping `rx` on expiry tells the receiver the answer is unwanted
        match tokio::time::timeout_at(self.deadline, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(MediaError::aborted("receiver stopped without responding")),
            Err(_) => Err(MediaError::DeadlineExceeded { after: self.after }),
        }
    }
}

/// Receiver side: frames in order, then an abort error if the sender went
/// away without signalling end-of-stream.
pub(crate) fn frame_stream(
    mut frames: mpsc::Receiver<UploadFrame>,
    close: oneshot::Receiver<()>,
) -> impl Stream<Item = MediaResult<UploadFrame>> + Send {
    async_stream::stream! {
        while let Some(frame) = frames.recv().await {
            yield Ok(frame);
        }
        if close.await.is_err() {
            yield Err(MediaError::aborted("sender disconnected before end-of-stream"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FileMetadata;
    use futures::StreamExt;

    fn upload_stream(
        frames: mpsc::Sender<UploadFrame>,
        close: oneshot::Sender<()>,
        response: oneshot::Receiver<MediaResult<MediaFile>>,
        after: Duration,
    ) -> UploadStream {
        UploadStream::new(frames, close, response, Instant::now() + after, after)
    }

    #[tokio::test]
    async fn closed_stream_ends_cleanly() {
        let (tx, rx) = mpsc::channel(4);
        let (close_tx, close_rx) = oneshot::channel();
        let (_resp_tx, resp_rx) = oneshot::channel();
        let mut upload = upload_stream(tx, close_tx, resp_rx, Duration::from_secs(5));

        upload
            .send(UploadFrame::metadata(FileMetadata::new("a", "image")))
            .await
            .unwrap();
        upload.send(UploadFrame::chunk(&b"xy"[..])).await.unwrap();

        let close = upload.close.take().unwrap();
        close.send(()).unwrap();
        drop(upload);

        let frames: Vec<_> = frame_stream(rx, close_rx).collect().await;
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.is_ok()));
    }

    #[tokio::test]
    async fn dropped_sender_is_an_abort() {
        let (tx, rx) = mpsc::channel(4);
        let (close_tx, close_rx) = oneshot::channel();
        let (_resp_tx, resp_rx) = oneshot::channel();
        let mut upload = upload_stream(tx, close_tx, resp_rx, Duration::from_secs(5));

        upload.send(UploadFrame::chunk(&b"xy"[..])).await.unwrap();
        drop(upload);

        let frames: Vec<_> = frame_stream(rx, close_rx).collect().await;
        assert_eq!(frames.len(), 2);
        assert!(matches!(frames[1], Err(MediaError::Aborted { .. })));
    }

    #[tokio::test]
    async fn send_after_receiver_failure_reports_its_error() {
        let (tx, rx) = mpsc::channel(1);
        let (close_tx, _close_rx) = oneshot::channel();
        let (resp_tx, resp_rx) = oneshot::channel();
        let mut upload = upload_stream(tx, close_tx, resp_rx, Duration::from_secs(5));

        drop(rx);
        resp_tx
            .send(Err(MediaError::PayloadTooLarge { limit: 1 }))
            .unwrap();

        let err = upload.send(UploadFrame::chunk(&b"xy"[..])).await.unwrap_err();
        assert!(matches!(err, MediaError::PayloadTooLarge { limit: 1 }));

        let err = upload.send(UploadFrame::chunk(&b"z"[..])).await.unwrap_err();
        assert!(matches!(err, MediaError::Protocol { .. }));
    }

    #[tokio::test]
    async fn response_past_the_deadline_is_refused() {
        let (tx, _rx) = mpsc::channel(1);
        let (close_tx, _close_rx) = oneshot::channel();
        let (resp_tx, resp_rx) = oneshot::channel();
        let upload = upload_stream(tx, close_tx, resp_rx, Duration::from_millis(20));

        let err = upload.close_and_recv().await.unwrap_err();
        assert!(matches!(err, MediaError::DeadlineExceeded { .. }));
        assert!(resp_tx.is_closed());
    }
}
