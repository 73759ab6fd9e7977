use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::MediaError;

/// The closed set of media kinds a file can be filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Image,
    Document,
    Resume,
}

impl FileType {
    pub const ALL: [FileType; 3] = [FileType::Image, FileType::Document, FileType::Resume];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Image => "image",
            FileType::Document => "document",
            FileType::Resume => "resume",
        }
    }
}

impl Default for FileType {
    fn default() -> Self {
        FileType::Document
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FileType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| MediaError::invalid_file_type(s))
    }
}

/// A stored file's metadata record.
///
/// Records are never edited: they appear when an upload completes and
/// disappear when the file is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    pub id: i64,
    /// Name as supplied by the uploader
    pub file_name: String,
    /// Blob store locator
    pub file_url: String,
    pub uploaded_by: Option<i64>,
    pub uploaded_at: DateTime<Utc>,
    pub file_type: FileType,
    pub file_size: u64,
}

/// A record about to be inserted; the repository assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMediaFile {
    pub file_name: String,
    pub file_url: String,
    pub uploaded_by: Option<i64>,
    pub uploaded_at: DateTime<Utc>,
    pub file_type: FileType,
    pub file_size: u64,
}

impl NewMediaFile {
    pub fn new(
        file_name: impl Into<String>,
        file_url: impl Into<String>,
        file_type: FileType,
        uploaded_by: Option<i64>,
        file_size: u64,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            file_url: file_url.into(),
            uploaded_by,
            uploaded_at: Utc::now(),
            file_type,
            file_size,
        }
    }

    pub fn with_id(self, id: i64) -> MediaFile {
        MediaFile {
            id,
            file_name: self.file_name,
            file_url: self.file_url,
            uploaded_by: self.uploaded_by,
            uploaded_at: self.uploaded_at,
            file_type: self.file_type,
            file_size: self.file_size,
        }
    }
}

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Normalised pagination input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// page < 1 becomes 1; a limit outside 1..=100 becomes 10.
    pub fn new(page: i64, limit: i64) -> Self {
        let page = if page < 1 { 1 } else { page.min(u32::MAX as i64) as u32 };
        let limit = if (1..=MAX_PAGE_LIMIT as i64).contains(&limit) {
            limit as u32
        } else {
            DEFAULT_PAGE_LIMIT
        };
        Self { page, limit }
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// One page of records plus the number of records matching the filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPage {
    pub files: Vec<MediaFile>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_types_parse_exactly() {
        assert_eq!("image".parse::<FileType>().unwrap(), FileType::Image);
        assert_eq!("resume".parse::<FileType>().unwrap(), FileType::Resume);
        assert!(matches!(
            "video".parse::<FileType>(),
            Err(MediaError::InvalidFileType { .. })
        ));
        assert!("Image".parse::<FileType>().is_err());
        assert!("".parse::<FileType>().is_err());
    }

    #[test]
    fn file_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&FileType::Document).unwrap(), "\"document\"");
    }

    #[test]
    fn page_request_normalizes_out_of_range_values() {
        assert_eq!(PageRequest::new(0, 0), PageRequest { page: 1, limit: 10 });
        assert_eq!(PageRequest::new(-4, 101), PageRequest { page: 1, limit: 10 });
        assert_eq!(PageRequest::new(3, 100), PageRequest { page: 3, limit: 100 });
        assert_eq!(PageRequest::new(2, 1).offset(), 1);
        assert_eq!(PageRequest::new(3, 25).offset(), 50);
    }

    #[test]
    fn unset_uploader_serializes_as_null() {
        let file = NewMediaFile::new("a.txt", "http://h/files/x_a.txt", FileType::Document, None, 3).with_id(1);
        let json = serde_json::to_value(&file).unwrap();
        assert!(json["uploaded_by"].is_null());
        assert_eq!(json["file_type"], "document");
        assert_eq!(json["file_size"], 3);
    }
}
