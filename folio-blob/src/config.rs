use std::path::PathBuf;

/// Which store backs the blob layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Files under `root`
    Local,
    /// Process memory, gone on restart
    Memory,
}

impl StorageBackend {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "local" | "fs" | "filesystem" => Some(Self::Local),
            "memory" | "mem" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Configuration for blob storage
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Directory blobs are written to; created on first save
    pub root: PathBuf,

    /// Prefix of every locator handed out, without a trailing slash
    pub base_url: String,

    pub backend: StorageBackend,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./uploads"),
            base_url: "http://localhost:8080/files".to_string(),
            backend: StorageBackend::Local,
        }
    }
}

impl BlobConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the storage root
    pub fn with_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.root = root.into();
        self
    }

    /// Set the locator prefix
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the backend
    pub fn with_backend(mut self, backend: StorageBackend) -> Self {
        self.backend = backend;
        self
    }
}
