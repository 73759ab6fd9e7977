use std::sync::Arc;

use axum::handler::Handler;
use axum::http::HeaderName;
use axum::routing::get;
use axum::Router;
use folio_blob::open_store;
use folio_media::{MediaLifecycle, MediaService, MemoryMediaRepository};
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::media::media_router;
use crate::{GatewaySettings, GatewayState};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub struct GatewayApp {
    pub state: GatewayState,
    pub router: Router<()>,
}

impl Clone for GatewayApp {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            router: self.router.clone(),
        }
    }
}

impl GatewayApp {
    pub fn new(state: GatewayState) -> Self {
        Self {
            state,
            router: Router::new(),
        }
    }

    pub fn use_router(mut self, path: &str, router: Router<()>) -> Self {
        self.router = self.router.nest(path, router);
        self
    }

    pub fn use_get<H, T>(mut self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + 'static,
        T: 'static,
    {
        self.router = self.router.route(path, get(handler));
        self
    }

    /// Mount the media routes under `/api/media`
    pub fn use_media(self) -> Self {
        let router = media_router(self.state.clone());
        self.use_router("/api/media", router)
    }

    /// The finished router: request ids are assigned when missing, traced,
    /// and echoed on the response.
    pub fn into_router(self) -> Router<()> {
        let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
        self.router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "folio gateway listening");
        axum::serve(listener, self.into_router()).await?;
        Ok(())
    }
}

/// Wire stores, repository and service from `settings`.
pub fn build(settings: GatewaySettings) -> GatewayApp {
    let store = open_store(&settings.storage);
    info!(backend = store.kind(), root = %settings.storage.root.display(), "blob store ready");

    let lifecycle = MediaLifecycle::new(Arc::new(MemoryMediaRepository::new()), store);
    let media = Arc::new(MediaService::new(lifecycle, settings.media.clone()));

    GatewayApp::new(GatewayState::new(media, settings))
        .use_media()
        .use_get("/health", || async { "ok" })
}
