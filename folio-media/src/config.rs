use std::time::Duration;

use folio_core::FolioConfigSnapshot;

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Limits applied to every upload session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConfig {
    /// Cumulative chunk bytes a session may carry
    pub max_upload_bytes: u64,
    /// Deadline for reassembling one upload
    pub upload_timeout: Duration,
    /// Frames buffered between sender and receiver
    pub channel_capacity: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl MediaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `upload.max_bytes`, `upload.timeout_secs` and
    /// `upload.channel_capacity`, keeping defaults for missing keys.
    pub fn from_snapshot(config: &FolioConfigSnapshot) -> Self {
        let defaults = Self::default();
        Self {
            max_upload_bytes: config
                .get_u64("upload.max_bytes")
                .unwrap_or(defaults.max_upload_bytes),
            upload_timeout: config
                .get_secs("upload.timeout_secs")
                .unwrap_or(defaults.upload_timeout),
            channel_capacity: config
                .get_usize("upload.channel_capacity")
                .filter(|c| *c > 0)
                .unwrap_or(defaults.channel_capacity),
        }
    }

    pub fn with_max_upload_bytes(mut self, max: u64) -> Self {
        self.max_upload_bytes = max;
        self
    }

    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }
}
