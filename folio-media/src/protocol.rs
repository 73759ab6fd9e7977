//! Frames of the chunked upload protocol.
//!
//! A session is exactly one [`UploadFrame::Metadata`], then any number of
//! [`UploadFrame::Chunk`]s, then end-of-stream from the sender. The receiver
//! answers once, after end-of-stream, with the stored record or an error.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// What the sender declares about the file before any bytes flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub file_name: String,
    pub file_type: String,
    #[serde(default)]
    pub uploaded_by: Option<i64>,
}

impl FileMetadata {
    pub fn new(file_name: impl Into<String>, file_type: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            file_type: file_type.into(),
            uploaded_by: None,
        }
    }

    pub fn with_uploader(mut self, uploaded_by: Option<i64>) -> Self {
        self.uploaded_by = uploaded_by;
        self
    }
}

/// One unit on the upload stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum UploadFrame {
    Metadata(FileMetadata),
    Chunk(Bytes),
}

impl UploadFrame {
    pub fn metadata(metadata: FileMetadata) -> Self {
        Self::Metadata(metadata)
    }

    pub fn chunk(data: impl Into<Bytes>) -> Self {
        Self::Chunk(data.into())
    }

    /// Payload bytes carried by this frame; zero for metadata
    pub fn payload_len(&self) -> usize {
        match self {
            Self::Metadata(_) => 0,
            Self::Chunk(data) => data.len(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Metadata(_) => "metadata",
            Self::Chunk(_) => "chunk",
        }
    }
}
