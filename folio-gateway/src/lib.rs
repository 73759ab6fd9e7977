//! folio-gateway: the HTTP face of the folio media pipeline.
//!
//! Multipart uploads are spooled, then relayed to the media service as one
//! chunked upload session; reads and deletes are plain JSON calls.

pub mod app;
pub mod identity;
pub mod media;
pub mod multipart;
pub mod relay;
pub mod settings;
pub mod state;
mod error;
pub use error::GatewayError;
pub use settings::GatewaySettings;
pub use state::GatewayState;

pub use app::{build, GatewayApp};
