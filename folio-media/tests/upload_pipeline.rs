use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use folio_blob::{BlobError, BlobResult, BlobStore, MemoryBlobStore};
use folio_media::prelude::*;
use folio_media::{MediaFileRepository, NewMediaFile, PageRequest};
use futures::FutureExt;

/// Repository whose inserts always fail
struct RejectingRepository;

#[async_trait]
impl MediaFileRepository for RejectingRepository {
    async fn create(&self, _file: NewMediaFile) -> MediaResult<MediaFile> {
        Err(MediaError::persistence("insert rejected"))
    }

    async fn get_by_id(&self, _id: i64) -> MediaResult<Option<MediaFile>> {
        Ok(None)
    }

    async fn delete(&self, _id: i64) -> MediaResult<()> {
        Ok(())
    }

    async fn list(
        &self,
        _page: PageRequest,
        _file_type: Option<FileType>,
    ) -> MediaResult<(Vec<MediaFile>, u64)> {
        Ok((Vec::new(), 0))
    }

    async fn list_by_uploader(
        &self,
        _uploader: i64,
        _page: PageRequest,
    ) -> MediaResult<(Vec<MediaFile>, u64)> {
        Ok((Vec::new(), 0))
    }
}

/// Memory repository whose inserts take `delay` to land
#[derive(Clone)]
struct SlowRepository {
    inner: MemoryMediaRepository,
    delay: Duration,
}

#[async_trait]
impl MediaFileRepository for SlowRepository {
    async fn create(&self, file: NewMediaFile) -> MediaResult<MediaFile> {
        tokio::time::sleep(self.delay).await;
        self.inner.create(file).await
    }

    async fn get_by_id(&self, id: i64) -> MediaResult<Option<MediaFile>> {
        self.inner.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> MediaResult<()> {
        self.inner.delete(id).await
    }

    async fn list(
        &self,
        page: PageRequest,
        file_type: Option<FileType>,
    ) -> MediaResult<(Vec<MediaFile>, u64)> {
        self.inner.list(page, file_type).await
    }

    async fn list_by_uploader(
        &self,
        uploader: i64,
        page: PageRequest,
    ) -> MediaResult<(Vec<MediaFile>, u64)> {
        self.inner.list_by_uploader(uploader, page).await
    }
}

/// Memory store whose deletes can be switched to fail
#[derive(Clone, Default)]
struct FlakyDeleteStore {
    inner: MemoryBlobStore,
    fail_deletes: Arc<AtomicBool>,
}

#[async_trait]
impl BlobStore for FlakyDeleteStore {
    async fn save(&self, name: &str, data: Bytes) -> BlobResult<String> {
        self.inner.save(name, data).await
    }

    async fn get(&self, locator: &str) -> BlobResult<Bytes> {
        self.inner.get(locator).await
    }

    async fn delete(&self, locator: &str) -> BlobResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(BlobError::delete(
                locator,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only medium"),
            ));
        }
        self.inner.delete(locator).await
    }

    fn kind(&self) -> &'static str {
        "flaky"
    }
}

fn service_with(
    repo: Arc<dyn MediaFileRepository>,
    store: Arc<dyn BlobStore>,
    config: MediaConfig,
) -> Arc<MediaService> {
    Arc::new(MediaService::new(MediaLifecycle::new(repo, store), config))
}

fn memory_service(config: MediaConfig) -> (Arc<MediaService>, MemoryMediaRepository, MemoryBlobStore) {
    let repo = MemoryMediaRepository::new();
    let store = MemoryBlobStore::new("http://localhost:8080/files");
    let service = service_with(Arc::new(repo.clone()), Arc::new(store.clone()), config);
    (service, repo, store)
}

fn metadata(name: &str, file_type: &str) -> UploadFrame {
    UploadFrame::metadata(FileMetadata::new(name, file_type).with_uploader(Some(42)))
}

async fn upload_chunks(
    service: &Arc<MediaService>,
    meta: UploadFrame,
    chunks: Vec<Bytes>,
) -> MediaResult<MediaFile> {
    let mut upload = service.open_upload();
    upload.send(meta).await?;
    for chunk in chunks {
        upload.send(UploadFrame::Chunk(chunk)).await?;
    }
    upload.close_and_recv().await
}

#[tokio::test]
async fn persistence_failure_removes_the_written_blob() {
    let store = MemoryBlobStore::new("http://localhost:8080/files");
    let service = service_with(
        Arc::new(RejectingRepository),
        Arc::new(store.clone()),
        MediaConfig::default(),
    );

    let err = upload_chunks(&service, metadata("a.txt", "document"), vec![Bytes::from_static(b"abc")])
        .await
        .unwrap_err();

    assert!(matches!(err, MediaError::Persistence { .. }));
    assert!(store.is_empty());
}

#[tokio::test]
async fn failed_compensation_still_reports_the_persistence_error() {
    let store = FlakyDeleteStore::default();
    store.fail_deletes.store(true, Ordering::SeqCst);
    let service = service_with(
        Arc::new(RejectingRepository),
        Arc::new(store.clone()),
        MediaConfig::default(),
    );

    let err = upload_chunks(&service, metadata("a.txt", "document"), vec![Bytes::from_static(b"abc")])
        .await
        .unwrap_err();

    assert!(matches!(err, MediaError::Persistence { .. }));
}

#[tokio::test]
async fn chunk_boundaries_do_not_change_stored_bytes() {
    let (service, _, store) = memory_service(MediaConfig::default());
    let payload: Vec<u8> = (0..10_000u32).map(|i| (i * 31 % 251) as u8).collect();

    let whole = upload_chunks(
        &service,
        metadata("whole.bin", "document"),
        vec![Bytes::from(payload.clone())],
    )
    .await
    .unwrap();

    let mut pieces = Vec::new();
    let mut offset = 0;
    for i in 0..100 {
        let end = if i == 99 { payload.len() } else { (offset + 1 + i * 3).min(payload.len()) };
        pieces.push(Bytes::copy_from_slice(&payload[offset..end]));
        offset = end;
    }
    let split = upload_chunks(&service, metadata("split.bin", "document"), pieces)
        .await
        .unwrap();

    let a = store.get(&whole.file_url).await.unwrap();
    let b = store.get(&split.file_url).await.unwrap();
    assert_eq!(a, b);
    assert_eq!(&a[..], &payload[..]);
    assert_ne!(whole.file_url, split.file_url);
}

#[tokio::test]
async fn chunk_before_metadata_creates_nothing() {
    let (service, repo, store) = memory_service(MediaConfig::default());

    let mut upload = service.open_upload();
    let sent = upload.send(UploadFrame::chunk(&b"abc"[..])).await;
    let result = match sent {
        Err(err) => Err(err),
        Ok(()) => upload.close_and_recv().await,
    };

    assert!(matches!(result, Err(MediaError::Protocol { .. })));
    assert!(repo.is_empty());
    assert!(store.is_empty());
}

#[tokio::test]
async fn second_metadata_frame_creates_nothing() {
    let (service, repo, store) = memory_service(MediaConfig::default());

    let frames = futures::stream::iter(vec![
        Ok(metadata("a.txt", "document")),
        Ok(metadata("b.txt", "document")),
        Ok(UploadFrame::chunk(&b"abc"[..])),
    ]);
    let err = service.upload_file(frames).await.unwrap_err();

    assert!(matches!(err, MediaError::Protocol { .. }));
    assert!(repo.is_empty());
    assert!(store.is_empty());
}

#[tokio::test]
async fn payload_over_the_ceiling_is_rejected_before_storage() {
    let (service, repo, store) = memory_service(MediaConfig::default().with_max_upload_bytes(1024));

    let ok = upload_chunks(&service, metadata("fits.bin", "image"), vec![Bytes::from(vec![7u8; 1024])])
        .await
        .unwrap();
    assert_eq!(ok.file_size, 1024);

    let err = upload_chunks(
        &service,
        metadata("big.bin", "image"),
        vec![Bytes::from(vec![7u8; 1000]), Bytes::from(vec![7u8; 25])],
    )
    .await
    .unwrap_err();

    assert!(matches!(err, MediaError::PayloadTooLarge { limit: 1024 }));
    assert_eq!(repo.len(), 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn unknown_file_type_has_no_side_effects() {
    let (service, repo, store) = memory_service(MediaConfig::default());

    let err = upload_chunks(&service, metadata("clip.mp4", "video"), vec![Bytes::from_static(b"abc")])
        .await
        .unwrap_err();

    assert!(matches!(err, MediaError::InvalidFileType { .. }));
    assert!(repo.is_empty());
    assert!(store.is_empty());
}

#[tokio::test]
async fn failed_blob_delete_keeps_the_record() {
    let repo = MemoryMediaRepository::new();
    let store = FlakyDeleteStore::default();
    let service = service_with(Arc::new(repo.clone()), Arc::new(store.clone()), MediaConfig::default());

    let file = upload_chunks(&service, metadata("a.txt", "document"), vec![Bytes::from_static(b"abc")])
        .await
        .unwrap();

    store.fail_deletes.store(true, Ordering::SeqCst);
    let err = service.delete_file(file.id).await.unwrap_err();
    assert!(matches!(err, MediaError::Storage { .. }));
    assert_eq!(service.get_file(file.id).await.unwrap(), file);

    store.fail_deletes.store(false, Ordering::SeqCst);
    service.delete_file(file.id).await.unwrap();
    assert!(repo.is_empty());
    assert!(store.inner.is_empty());
}

#[tokio::test]
async fn dropped_sender_aborts_the_session() {
    let (service, repo, store) = memory_service(MediaConfig::default());

    let mut upload = service.open_upload();
    upload.send(metadata("a.txt", "document")).await.unwrap();
    upload.send(UploadFrame::chunk(&b"abc"[..])).await.unwrap();
    drop(upload);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(repo.is_empty());
    assert!(store.is_empty());
}

#[tokio::test]
async fn stalled_sender_hits_the_deadline() {
    let (service, repo, _) = memory_service(
        MediaConfig::default().with_upload_timeout(Duration::from_millis(50)),
    );

    let mut upload = service.open_upload();
    upload.send(metadata("a.txt", "document")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let err = upload.close_and_recv().await.unwrap_err();
    assert!(matches!(err, MediaError::DeadlineExceeded { .. }));
    assert!(repo.is_empty());
}

#[tokio::test]
async fn metadata_only_upload_stores_an_empty_file() {
    let (service, _, store) = memory_service(MediaConfig::default());

    let file = upload_chunks(&service, metadata("empty.txt", "document"), Vec::new())
        .await
        .unwrap();

    assert_eq!(file.file_size, 0);
    assert!(store.get(&file.file_url).await.unwrap().is_empty());
}

#[tokio::test]
async fn commit_that_outlives_the_deadline_is_discarded() {
    let repo = SlowRepository {
        inner: MemoryMediaRepository::new(),
        delay: Duration::from_millis(300),
    };
    let store = MemoryBlobStore::new("http://localhost:8080/files");
    let service = service_with(
        Arc::new(repo.clone()),
        Arc::new(store.clone()),
        MediaConfig::default().with_upload_timeout(Duration::from_millis(100)),
    );

    let err = upload_chunks(&service, metadata("a.txt", "document"), vec![Bytes::from_static(b"abc")])
        .await
        .unwrap_err();
    assert!(matches!(err, MediaError::DeadlineExceeded { .. }));

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(repo.inner.is_empty());
    assert!(store.is_empty());
}

#[tokio::test]
async fn sender_gone_before_commit_stores_nothing() {
    let (service, repo, store) = memory_service(MediaConfig::default());

    let mut upload = service.open_upload();
    upload.send(metadata("a.txt", "document")).await.unwrap();
    upload.send(UploadFrame::chunk(&b"abc"[..])).await.unwrap();
    // End-of-stream goes out, then the caller stops waiting for the answer
    assert!(upload.close_and_recv().now_or_never().is_none());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(repo.is_empty());
    assert!(store.is_empty());
}
