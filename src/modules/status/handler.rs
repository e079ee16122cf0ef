use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        IntoResponse, Sse,
        sse::{Event, KeepAlive},
    },
};
use futures_util::{StreamExt, future};
use serde_json::json;

use super::{bus, service};
use crate::common::error::ApiError;
use crate::common::response::{ApiResponse, ApiSuccess};
use crate::state::AppState;

/// Long-lived per-job status stream. Each published token is framed as an SSE
/// event with payload `{"status": <token>}`; the stream ends server-side
/// after a terminal token. A keep-alive comment ping covers the quiet
/// stretches so idle proxies do not cut the connection.
#[utoipa::path(
    get,
    path = "/api/v1/status/{upload_id}/events",
    params(
        ("upload_id" = String, Path, description = "Job id")
    ),
    responses(
        (status = 200, description = "SSE status stream", body = String, content_type = "text/event-stream")
    ),
    tag = "Status"
)]
pub async fn status_events(
    State(state): State<AppState>,
    Path(upload_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tokens = bus::subscribe(&state.redis, &upload_id)
        .await
        .map_err(ApiError::Internal)?;

    // Emit each token, including the terminal one, then end. Dropping the
    // stream on client disconnect releases the subscription.
    let stream = tokens.scan(false, |done, token| {
        if *done {
            return future::ready(None);
        }
        if bus::is_terminal(&token) {
            *done = true;
        }
        let event = Event::default().data(json!({ "status": token }).to_string());
        future::ready(Some(Ok::<_, Infallible>(event)))
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}

/// Poll-path status, backed by the storage-listing projection when no cached
/// value is available.
#[utoipa::path(
    get,
    path = "/api/v1/status/{upload_id}",
    params(
        ("upload_id" = String, Path, description = "Job id")
    ),
    responses(
        (status = 200, description = "Job status", body = ApiResponse<super::dto::StatusResponse>),
        (status = 404, description = "Unknown job id"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Status"
)]
pub async fn status_poll(
    State(state): State<AppState>,
    Path(upload_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let status = service::get_status(&state, &upload_id).await?;
    Ok(ApiSuccess(
        ApiResponse::success(status, "Status retrieved successfully"),
        StatusCode::OK,
    ))
}
