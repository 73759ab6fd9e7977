use std::sync::Arc;

use folio_media::MediaService;

use crate::identity::{HeaderIdentity, IdentityResolver};
use crate::GatewaySettings;

/// Shared handler state
#[derive(Clone)]
pub struct GatewayState {
    pub media: Arc<MediaService>,
    pub identity: Arc<dyn IdentityResolver>,
    pub settings: Arc<GatewaySettings>,
}

impl GatewayState {
    pub fn new(media: Arc<MediaService>, settings: GatewaySettings) -> Self {
        Self {
            media,
            identity: Arc::new(HeaderIdentity::default()),
            settings: Arc::new(settings),
        }
    }

    pub fn with_identity<I>(mut self, identity: I) -> Self
    where
        I: IdentityResolver + 'static,
    {
        self.identity = Arc::new(identity);
        self
    }
}
