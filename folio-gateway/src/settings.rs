use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use folio_blob::{BlobConfig, StorageBackend};
use folio_core::{FolioConfig, FolioConfigSnapshot};
use folio_media::MediaConfig;

/// Environment prefix: `FOLIO__STORAGE__PATH` becomes `storage.path`
pub const ENV_PREFIX: &str = "FOLIO__";

pub const DEFAULT_CHUNK_BYTES: usize = 64 * 1024;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything the gateway binary needs to start
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub host: String,
    pub port: u16,
    pub storage: BlobConfig,
    pub media: MediaConfig,
    /// Size of each chunk frame relayed to the media service
    pub chunk_bytes: usize,
    /// Deadline for get, list and delete calls
    pub request_timeout: Duration,
    /// Where multipart file parts are spooled while the form is read
    pub spool_dir: PathBuf,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            storage: BlobConfig::default(),
            media: MediaConfig::default(),
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            spool_dir: std::env::temp_dir(),
        }
    }
}

impl GatewaySettings {
    /// Defaults overlaid with `FOLIO__*` environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = FolioConfig::new();
        config.load_env(ENV_PREFIX);
        Self::from_snapshot(&config.snapshot())
    }

    pub fn from_snapshot(config: &FolioConfigSnapshot) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let port = match config.get("http.port") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("invalid http.port: {:?}", raw))?,
            None => defaults.port,
        };

        let mut storage = defaults.storage.clone();
        if let Some(raw) = config.get("storage.backend") {
            let backend = StorageBackend::parse(raw)
                .with_context(|| format!("unknown storage.backend: {:?}", raw))?;
            storage = storage.with_backend(backend);
        }
        if let Some(path) = config.get_string("storage.path") {
            storage = storage.with_root(path);
        }
        if let Some(url) = config.get_string("storage.url") {
            storage = storage.with_base_url(url);
        }

        Ok(Self {
            host: config.get_string("http.host").unwrap_or(defaults.host),
            port,
            storage,
            media: MediaConfig::from_snapshot(config),
            chunk_bytes: config
                .get_usize("upload.chunk_bytes")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.chunk_bytes),
            request_timeout: config
                .get_secs("request.timeout_secs")
                .unwrap_or(defaults.request_timeout),
            spool_dir: defaults.spool_dir,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn with_storage(mut self, storage: BlobConfig) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_media(mut self, media: MediaConfig) -> Self {
        self.media = media;
        self
    }

    pub fn with_spool_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.spool_dir = dir.into();
        self
    }
}
