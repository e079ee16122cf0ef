use std::time::Duration;

use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use super::dto::{S3Event, UploadSlotResponse};
use super::events::TranscodeJob;
use super::service;
use crate::common::error::ApiError;
use crate::common::response::{ApiResponse, ApiSuccess};
use crate::infrastructure::queue::rabbitmq::TRANSCODE_QUEUE;
use crate::state::AppState;

const UPLOAD_URL_VALIDITY: Duration = Duration::from_secs(60 * 60);

/// Upload handshake: mints a job id and hands back a time-limited write URL
/// into the pending bucket. The client uploads directly to storage; we only
/// hear back through the bucket notification.
#[utoipa::path(
    post,
    path = "/api/v1/uploads/{filename}",
    params(
        ("filename" = String, Path, description = "Client-side filename, used for the extension")
    ),
    responses(
        (status = 200, description = "Upload slot created", body = ApiResponse<UploadSlotResponse>),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Upload"
)]
pub async fn create_upload_slot(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let upload_id = Uuid::new_v4().as_simple().to_string();
    let ext = service::extension_of(&filename);
    let s3_key = service::pending_key(&upload_id, &ext);

    let content_type = mime_guess::from_ext(&ext).first_or_octet_stream();

    let presigned_url = state
        .storage
        .presigned_put_url(&s3_key, content_type.as_ref(), UPLOAD_URL_VALIDITY)
        .await
        .map_err(ApiError::Internal)?;

    let response = UploadSlotResponse {
        presigned_url,
        upload_id,
        s3_key,
    };

    Ok(ApiSuccess(
        ApiResponse::success(response, "Upload slot created"),
        StatusCode::OK,
    ))
}

/// Ingest entry point: the bucket notification for a finished upload. Maps
/// the object key back to a job id and enqueues a transcode job on the
/// dedicated queue. Malformed events enqueue nothing.
#[utoipa::path(
    post,
    path = "/api/v1/events/s3",
    responses(
        (status = 200, description = "Transcode job dispatched"),
        (status = 422, description = "Malformed event"),
        (status = 500, description = "Failed to dispatch job")
    ),
    tag = "Upload"
)]
pub async fn s3_webhook(
    State(state): State<AppState>,
    Json(event): Json<S3Event>,
) -> Result<impl IntoResponse, ApiError> {
    let encoded_key = event
        .records
        .first()
        .and_then(|r| r.s3.as_ref())
        .and_then(|s3| s3.object.as_ref())
        .and_then(|obj| obj.key.as_deref())
        .ok_or_else(|| {
            ApiError::UnprocessableEvent("Malformed S3 event: missing object key".to_string())
        })?;

    // Bucket notifications URL-encode the key.
    let s3_key = urlencoding::decode(encoded_key)
        .map_err(|_| {
            ApiError::UnprocessableEvent(
                "Malformed S3 event: object key is not properly URL-encoded".to_string(),
            )
        })?
        .into_owned();

    if s3_key.is_empty() {
        return Err(ApiError::UnprocessableEvent(
            "Malformed S3 event: missing object key".to_string(),
        ));
    }

    let upload_id = service::extract_upload_id(&s3_key).ok_or_else(|| {
        ApiError::UnprocessableEvent("Malformed S3 event: invalid key format".to_string())
    })?;

    let job = TranscodeJob {
        upload_id: upload_id.clone(),
        s3_key: s3_key.clone(),
    };
    let payload = serde_json::to_vec(&job).map_err(|e| ApiError::Internal(e.into()))?;

    state
        .queue
        .publish(TRANSCODE_QUEUE, &payload)
        .await
        .map_err(|e| ApiError::Internal(anyhow!("Failed to start video processing job: {}", e)))?;

    info!(
        "Dispatched transcode job for upload_id: {}, s3_key: {}",
        upload_id, s3_key
    );

    Ok(ApiSuccess(
        ApiResponse::success((), "Transcode job dispatched"),
        StatusCode::OK,
    ))
}
