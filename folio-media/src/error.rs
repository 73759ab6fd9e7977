use std::time::Duration;

use folio_blob::BlobError;
use folio_core::FolioError;
use thiserror::Error;

/// Result type for media operations
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors raised by the media service, its sessions and its repositories
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Invalid file type: {file_type:?} (expected image, document or resume)")]
    InvalidFileType { file_type: String },

    #[error("File not found: {id}")]
    FileNotFound { id: i64 },

    #[error("Protocol violation: {message}")]
    Protocol { message: String },

    #[error("Upload exceeds the maximum size of {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    #[error("Upload aborted: {reason}")]
    Aborted { reason: String },

    #[error("Upload did not complete within {}s", .after.as_secs())]
    DeadlineExceeded { after: Duration },

    #[error("Upload failed: {source}")]
    UploadFailed {
        #[source]
        source: BlobError,
    },

    #[error("Storage error: {source}")]
    Storage {
        #[source]
        source: BlobError,
    },

    #[error("Persistence error: {message}")]
    Persistence {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl MediaError {
    pub fn invalid_file_type<S: Into<String>>(file_type: S) -> Self {
        Self::InvalidFileType {
            file_type: file_type.into(),
        }
    }

    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn aborted<S: Into<String>>(reason: S) -> Self {
        Self::Aborted {
            reason: reason.into(),
        }
    }

    /// Create a persistence error without an underlying cause
    pub fn persistence<S: Into<String>>(message: S) -> Self {
        Self::Persistence {
            message: message.into(),
            source: None,
        }
    }

    /// Create a persistence error wrapping a driver error
    pub fn persistence_from<S, E>(message: S, error: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Persistence {
            message: message.into(),
            source: Some(Box::new(error)),
        }
    }

    /// Errors caused by what the caller sent, as opposed to server faults
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFileType { .. } | Self::FileNotFound { .. }
                | Self::PayloadTooLarge { .. }
        )
    }
}

impl From<MediaError> for FolioError {
    fn from(err: MediaError) -> Self {
        let message = err.to_string();
        let folio = match &err {
            MediaError::InvalidFileType { .. } => FolioError::bad_request(message),
            MediaError::FileNotFound { id } => {
                FolioError::not_found(message).with_data(serde_json::json!({ "id": id }))
            }
            MediaError::PayloadTooLarge { limit } => {
                FolioError::payload_too_large(message).with_data(serde_json::json!({ "limit": limit }))
            }
            _ => FolioError::general_error(message),
        };
        folio.with_source(anyhow::Error::new(err))
    }
}
