//! # folio configuration
//!
//! A minimal configuration store based on string keys and string values,
//! mirroring the `set` / `get` style. Components never read the environment
//! themselves: the binary fills a [`FolioConfig`], takes a
//! [`FolioConfigSnapshot`] and hands typed settings to each component.
//!
//! ```rust
//! use folio_core::FolioConfig;
//!
//! let mut config = FolioConfig::new();
//! config.set("upload.max_bytes", "1024");
//!
//! let snapshot = config.snapshot();
//! assert_eq!(snapshot.get_u64("upload.max_bytes"), Some(1024));
//! ```
//!
//! ## Environment overrides
//!
//! [`FolioConfig::load_env`] copies every variable carrying the prefix,
//! lowercased, with `__` turned into `.`:
//!
//! ```bash
//! export FOLIO__STORAGE__PATH=/var/lib/folio/uploads   # -> storage.path
//! ```

use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct FolioConfig {
    values: HashMap<String, String>,
}

impl FolioConfig {
    /// Create an empty config store.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Set a key only when it is not present yet.
    pub fn set_default<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.entry(key.into()).or_insert_with(|| value.into());
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Check whether a key is present.
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Load `PREFIX` variables from the process environment.
    pub fn load_env(&mut self, prefix: &str) {
        self.load_vars(prefix, std::env::vars());
    }

    /// Load `PREFIX` variables from any iterator of pairs.
    pub fn load_vars<I>(&mut self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                if !normalized.is_empty() {
                    self.set(normalized, value);
                }
            }
        }
    }

    pub fn snapshot(&self) -> FolioConfigSnapshot {
        FolioConfigSnapshot::new(self.values.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FolioConfigSnapshot {
    map: HashMap<String, String>,
}

impl FolioConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    /// Whole seconds, e.g. `upload.timeout_secs = "60"`.
    pub fn get_secs(&self, key: &str) -> Option<Duration> {
        self.get_u64(key).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_vars_are_normalized_under_prefix() {
        let mut config = FolioConfig::new();
        config.load_vars(
            "FOLIO__",
            vec![
                ("FOLIO__STORAGE__PATH".to_string(), "/srv/uploads".to_string()),
                ("FOLIO__UPLOAD__MAX_BYTES".to_string(), "2048".to_string()),
                ("HOME".to_string(), "/root".to_string()),
            ],
        );

        assert_eq!(config.get("storage.path"), Some("/srv/uploads"));
        assert_eq!(config.get("upload.max_bytes"), Some("2048"));
        assert!(!config.has("home"));
    }

    #[test]
    fn defaults_do_not_override_loaded_values() {
        let mut config = FolioConfig::new();
        config.set("http.port", "9000");
        config.set_default("http.port", "8080");
        config.set_default("http.host", "127.0.0.1");

        let snapshot = config.snapshot();
        assert_eq!(snapshot.get_u64("http.port"), Some(9000));
        assert_eq!(snapshot.get("http.host"), Some("127.0.0.1"));
    }

    #[test]
    fn typed_getters_reject_garbage() {
        let mut config = FolioConfig::new();
        config.set("upload.timeout_secs", "60");
        config.set("upload.max_bytes", "ten megs");

        let snapshot = config.snapshot();
        assert_eq!(snapshot.get_secs("upload.timeout_secs"), Some(Duration::from_secs(60)));
        assert_eq!(snapshot.get_u64("upload.max_bytes"), None);
    }
}
