use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use folio_core::FolioError;
use folio_media::MediaError;

#[derive(Debug)]
pub struct GatewayError(pub anyhow::Error);

impl From<anyhow::Error> for GatewayError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<FolioError> for GatewayError {
    fn from(e: FolioError) -> Self {
        Self(e.into_anyhow())
    }
}

impl From<MediaError> for GatewayError {
    fn from(e: MediaError) -> Self {
        FolioError::from(e).into()
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let folio = match self.0.chain().find_map(|e| e.downcast_ref::<FolioError>()) {
            Some(folio) => folio.sanitize_for_client(),
            None => FolioError::general_error(self.0.to_string()),
        };

        let status = StatusCode::from_u16(folio.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = ?self.0, "request failed");
        }
        (status, Json(folio.to_json())).into_response()
    }
}
