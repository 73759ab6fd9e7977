use thiserror::Error;

/// Result type for blob operations
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors that can occur during blob operations
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Blob not found: {locator}")]
    NotFound { locator: String },

    #[error("Invalid locator: {message}")]
    Invalid { message: String },

    #[error("Blob already exists: {name}")]
    AlreadyExists { name: String },

    #[error("Failed to write blob {name}: {source}")]
    Write {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read blob {locator}: {source}")]
    Read {
        locator: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to delete blob {locator}: {source}")]
    Delete {
        locator: String,
        #[source]
        source: std::io::Error,
    },
}

impl BlobError {
    /// Create an invalid locator error
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(locator: S) -> Self {
        Self::NotFound {
            locator: locator.into(),
        }
    }

    pub fn write<S: Into<String>>(name: S, source: std::io::Error) -> Self {
        Self::Write {
            name: name.into(),
            source,
        }
    }

    pub fn read<S: Into<String>>(locator: S, source: std::io::Error) -> Self {
        Self::Read {
            locator: locator.into(),
            source,
        }
    }

    pub fn delete<S: Into<String>>(locator: S, source: std::io::Error) -> Self {
        Self::Delete {
            locator: locator.into(),
            source,
        }
    }

    /// True for failures on the write path (`save`).
    pub fn is_write_error(&self) -> bool {
        matches!(self, Self::Write { .. } | Self::AlreadyExists { .. })
    }

    /// True for failures on the read path (`get`).
    pub fn is_read_error(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Read { .. })
    }
}
