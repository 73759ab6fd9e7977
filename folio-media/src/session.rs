use bytes::{Bytes, BytesMut};

use crate::{FileMetadata, MediaError, MediaResult, UploadFrame};

/// A fully reassembled upload, ready for the lifecycle
#[derive(Debug, Clone)]
pub struct CompletedUpload {
    pub metadata: FileMetadata,
    pub data: Bytes,
}

/// Receiver-side state of one upload session.
///
/// Enforces the frame grammar and the cumulative byte ceiling. Chunks are
/// appended in receipt order; nothing past the ceiling is ever buffered.
#[derive(Debug)]
pub struct UploadSession {
    max_bytes: u64,
    metadata: Option<FileMetadata>,
    buffer: BytesMut,
}

impl UploadSession {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            metadata: None,
            buffer: BytesMut::new(),
        }
    }

    pub fn received_bytes(&self) -> u64 {
        self.buffer.len() as u64
    }

    pub fn accept(&mut self, frame: UploadFrame) -> MediaResult<()> {
        match frame {
            UploadFrame::Metadata(metadata) => {
                if self.metadata.is_some() {
                    return Err(MediaError::protocol("metadata frame received twice"));
                }
                if metadata.file_name.is_empty() {
                    return Err(MediaError::protocol("metadata frame has an empty file name"));
                }
                self.metadata = Some(metadata);
            }
            UploadFrame::Chunk(data) => {
                if self.metadata.is_none() {
                    return Err(MediaError::protocol("chunk frame received before metadata"));
                }
                let total = self.received_bytes() + data.len() as u64;
                if total > self.max_bytes {
                    return Err(MediaError::PayloadTooLarge {
                        limit: self.max_bytes,
                    });
                }
                self.buffer.extend_from_slice(&data);
            }
        }
        Ok(())
    }

    /// Close the session after end-of-stream
    pub fn finish(self) -> MediaResult<CompletedUpload> {
        let metadata = self
            .metadata
            .ok_or_else(|| MediaError::protocol("stream ended without a metadata frame"))?;

        Ok(CompletedUpload {
            metadata,
            data: self.buffer.freeze(),
        })
    }
}
