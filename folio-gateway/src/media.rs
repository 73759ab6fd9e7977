use std::future::Future;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use folio_core::FolioError;
use folio_media::{FileMetadata, MediaError, MediaFile, MediaPage, MediaResult};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::identity::require_user;
use crate::multipart::read_upload_form;
use crate::relay::relay_upload;
use crate::{GatewayError, GatewayState};

/// Routes mounted under `/api/media`
pub fn media_router(state: GatewayState) -> Router<()> {
    Router::new()
        .route("/", get(list_files))
        .route("/upload", post(upload_file))
        .route("/my-files", get(my_files))
        .route("/{id}", get(get_file).delete(delete_file))
        .route("/{id}/content", get(file_content))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub file_type: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListQuery {
    /// Unparseable values fall back to 0, which paging normalises.
    fn number(raw: &Option<String>) -> i64 {
        raw.as_deref()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(0)
    }

    fn page(&self) -> i64 {
        Self::number(&self.page)
    }

    fn limit(&self) -> i64 {
        Self::number(&self.limit)
    }
}

fn parse_id(raw: &str) -> Result<i64, GatewayError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| FolioError::bad_request("Invalid ID").into())
}

async fn within<T, F>(limit: Duration, call: F) -> Result<T, GatewayError>
where
    F: Future<Output = MediaResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(GatewayError::from),
        Err(_) => Err(FolioError::general_error(format!(
            "Request timed out after {}s",
            limit.as_secs()
        ))
        .into()),
    }
}

async fn upload_file(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Body,
) -> Result<(StatusCode, Json<MediaFile>), GatewayError> {
    let user = require_user(state.identity.as_ref(), &headers).await?;
    let settings = &state.settings;
    let after = settings.media.upload_timeout;

    // Spooling commits nothing, so it can be cut off here. The relayed
    // session runs on its own deadline, shared with the media service.
    let form = tokio::time::timeout(
        after,
        read_upload_form(
            &headers,
            body,
            settings.media.max_upload_bytes,
            &settings.spool_dir,
        ),
    )
    .await
    .map_err(|_| GatewayError::from(MediaError::DeadlineExceeded { after }))??;

    let metadata = FileMetadata::new(form.file.file_name(), form.file_type.clone())
        .with_uploader(Some(user));
    let file = relay_upload(&state.media, metadata, &form.file, settings.chunk_bytes).await?;

    Ok((StatusCode::CREATED, Json(file)))
}

async fn get_file(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Json<MediaFile>, GatewayError> {
    let id = parse_id(&id)?;
    let file = within(state.settings.request_timeout, state.media.get_file(id)).await?;
    Ok(Json(file))
}

async fn delete_file(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, GatewayError> {
    let id = parse_id(&id)?;
    within(state.settings.request_timeout, state.media.delete_file(id)).await?;
    Ok(Json(json!({ "message": "File deleted successfully" })))
}

async fn list_files(
    State(state): State<GatewayState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<MediaPage>, GatewayError> {
    let page = within(
        state.settings.request_timeout,
        state
            .media
            .list_files(query.page(), query.limit(), query.file_type.as_deref()),
    )
    .await?;
    Ok(Json(page))
}

async fn my_files(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<MediaPage>, GatewayError> {
    let user = require_user(state.identity.as_ref(), &headers).await?;
    let page = within(
        state.settings.request_timeout,
        state.media.files_by_user(user, query.page(), query.limit()),
    )
    .await?;
    Ok(Json(page))
}

fn attachment(file_name: &str) -> HeaderValue {
    let safe: String = file_name
        .chars()
        .map(|c| if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' { c } else { '_' })
        .collect();
    HeaderValue::from_str(&format!("attachment; filename=\"{}\"", safe))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

async fn file_content(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Response, GatewayError> {
    let id = parse_id(&id)?;
    let (file, data) = within(state.settings.request_timeout, state.media.read_content(id)).await?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
            (header::CONTENT_DISPOSITION, attachment(&file.file_name)),
        ],
        data,
    )
        .into_response())
}
