//! folio-core: shared, transport-agnostic pieces of the folio media pipeline.

pub mod config;
pub mod errors;

pub use config::{FolioConfig, FolioConfigSnapshot};
pub use errors::{ErrorKind, FolioError, FolioResult};
