use std::path::{Path, PathBuf};

use anyhow::Context;
use axum::body::Body;
use axum::http::{header, HeaderMap};
use folio_core::FolioError;
use folio_media::{FileType, MediaError};
use multer::{Constraints, Multipart, SizeLimit};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Room for boundaries, part headers and the text fields around the file
const FORM_OVERHEAD_BYTES: u64 = 64 * 1024;

pub const FILE_FIELD: &str = "file";
pub const FILE_TYPE_FIELD: &str = "file_type";

/// A file part written to disk while the rest of the form is read.
/// The file is removed when this value is dropped.
#[derive(Debug)]
pub struct SpooledFile {
    path: PathBuf,
    file_name: String,
    size: u64,
}

impl SpooledFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Drop for SpooledFile {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %err, "failed to remove spooled upload");
            }
        }
    }
}

/// The fields of an upload form the gateway cares about
#[derive(Debug)]
pub struct UploadForm {
    pub file: SpooledFile,
    /// Raw value; validated by the media service
    pub file_type: String,
}

fn too_large(limit: u64) -> anyhow::Error {
    FolioError::from(MediaError::PayloadTooLarge { limit }).into_anyhow()
}

fn map_multer(err: multer::Error, limit: u64) -> anyhow::Error {
    match err {
        multer::Error::FieldSizeExceeded { .. } | multer::Error::StreamSizeExceeded { .. } => {
            too_large(limit)
        }
        other => FolioError::bad_request(format!("Malformed multipart body: {}", other)).into_anyhow(),
    }
}

/// Read a `multipart/form-data` upload, spooling the `file` part to
/// `spool_dir`. Bodies larger than `max_file_bytes` plus form overhead are
/// rejected without being read to the end.
pub async fn read_upload_form(
    headers: &HeaderMap,
    body: Body,
    max_file_bytes: u64,
    spool_dir: &Path,
) -> anyhow::Result<UploadForm> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let boundary = multer::parse_boundary(content_type).map_err(|_| {
        FolioError::bad_request("Expected a multipart/form-data body").into_anyhow()
    })?;

    let max_stream = max_file_bytes.saturating_add(FORM_OVERHEAD_BYTES);
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len > max_stream) {
        return Err(too_large(max_file_bytes));
    }

    let constraints = Constraints::new().size_limit(
        SizeLimit::new()
            .whole_stream(max_stream)
            .per_field(max_file_bytes),
    );
    let mut multipart = Multipart::with_constraints(body.into_data_stream(), boundary, constraints);

    let mut file: Option<SpooledFile> = None;
    let mut file_type: Option<String> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| map_multer(e, max_file_bytes))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(FILE_FIELD) => {
                if file.is_some() {
                    return Err(FolioError::bad_request("Only one file may be uploaded per request").into_anyhow());
                }
                let file_name = field.file_name().unwrap_or_default().to_string();
                if file_name.is_empty() {
                    return Err(FolioError::bad_request("File is required").into_anyhow());
                }

                let mut spooled = SpooledFile {
                    path: spool_dir.join(format!("folio-upload-{}", uuid::Uuid::new_v4())),
                    file_name,
                    size: 0,
                };
                let mut out = tokio::fs::File::create(&spooled.path)
                    .await
                    .context("failed to create spool file")?;

                while let Some(chunk) = field.chunk().await.map_err(|e| map_multer(e, max_file_bytes))? {
                    out.write_all(&chunk).await.context("failed to write spool file")?;
                    spooled.size += chunk.len() as u64;
                }
                out.flush().await.context("failed to flush spool file")?;

                debug!(file_name = %spooled.file_name, size = spooled.size, "file part spooled");
                file = Some(spooled);
            }
            Some(FILE_TYPE_FIELD) => {
                let value = field.text().await.map_err(|e| map_multer(e, max_file_bytes))?;
                file_type = Some(value.trim().to_string());
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| FolioError::bad_request("File is required").into_anyhow())?;
    let file_type = file_type
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| FileType::default().as_str().to_string());

    Ok(UploadForm { file, file_type })
}
