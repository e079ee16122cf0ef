use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use time::OffsetDateTime;

use super::cache::{self, CACHE_TTL_MARGIN, CacheRecord};
use super::rewrite;
use crate::common::error::ApiError;
use crate::state::AppState;

pub const HLS_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

fn manifest_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, HLS_CONTENT_TYPE)], body).into_response()
}

/// Master manifest, rewritten so each variant line points at the signed
/// per-resolution endpoint. No signatures are embedded at this level, so a
/// plain TTL cache is enough.
#[utoipa::path(
    get,
    path = "/api/v1/manifest/{upload_id}",
    params(
        ("upload_id" = String, Path, description = "Job id")
    ),
    responses(
        (status = 200, description = "Rewritten master manifest", body = String, content_type = "application/vnd.apple.mpegurl"),
        (status = 404, description = "Job not ready or unknown")
    ),
    tag = "Delivery"
)]
pub async fn master_manifest(
    State(state): State<AppState>,
    Path(upload_id): Path<String>,
) -> Result<Response, ApiError> {
    let cache_key = format!("master:{}", upload_id);

    if let Some(cached) = state.redis.cache_get(&cache_key).await {
        return Ok(manifest_response(cached));
    }

    let s3_key = format!("videos/{}/master.m3u8", upload_id);
    let body = state
        .storage
        .get_object(&state.config.streaming_bucket, &s3_key)
        .await
        .map_err(|_| ApiError::NotFound("Master manifest not found".to_string()))?;

    let content = String::from_utf8_lossy(&body).into_owned();
    let rewritten = rewrite::rewrite_master(&content, &upload_id);

    state
        .redis
        .cache_put_detached(cache_key, rewritten.clone(), state.config.signature_ttl as u64);

    Ok(manifest_response(rewritten))
}

/// Per-resolution manifest with every segment line replaced by a signed,
/// expiring URL. Refresh-ahead: a cached copy is served only while enough
/// signature validity remains; otherwise the manifest is re-signed and the
/// cache updated after the response is already on its way.
#[utoipa::path(
    get,
    path = "/api/v1/manifest/{upload_id}/{resolution}",
    params(
        ("upload_id" = String, Path, description = "Job id"),
        ("resolution" = String, Path, description = "Resolution tag, e.g. 720p")
    ),
    responses(
        (status = 200, description = "Signed media manifest", body = String, content_type = "application/vnd.apple.mpegurl"),
        (status = 404, description = "Variant not ready or unknown")
    ),
    tag = "Delivery"
)]
pub async fn media_manifest(
    State(state): State<AppState>,
    Path((upload_id, resolution)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let cache_key = format!("playlist:{}:{}", upload_id, resolution);
    let signature_ttl = state.config.signature_ttl;
    let threshold = cache::refresh_threshold(signature_ttl);
    let now = OffsetDateTime::now_utc().unix_timestamp();

    if let Some(cached) = state.redis.cache_get(&cache_key).await {
        match serde_json::from_str::<CacheRecord>(&cached) {
            Ok(record) if record.is_fresh(now, threshold) => {
                return Ok(manifest_response(record.playlist));
            }
            // Stale or undecodable: fall through to regenerate.
            _ => {}
        }
    }

    let s3_key = format!("videos/{}/{}/playlist.m3u8", upload_id, resolution);
    let body = state
        .storage
        .get_object(&state.config.streaming_bucket, &s3_key)
        .await
        .map_err(|_| ApiError::NotFound("Media manifest not found".to_string()))?;

    let content = String::from_utf8_lossy(&body).into_owned();
    let expires_at = now + signature_ttl;

    // Signing every segment line is CPU-bound; keep it off the I/O threads.
    let secret = state.config.uri_secret.clone();
    let rewritten = tokio::task::spawn_blocking({
        let upload_id = upload_id.clone();
        let resolution = resolution.clone();
        move || rewrite::rewrite_media(&content, &upload_id, &resolution, expires_at, &secret)
    })
    .await
    .map_err(|e| ApiError::Internal(e.into()))?;

    let record = CacheRecord {
        playlist: rewritten.clone(),
        expires_at,
    };
    if let Ok(json) = serde_json::to_string(&record) {
        state
            .redis
            .cache_put_detached(cache_key, json, (signature_ttl + CACHE_TTL_MARGIN) as u64);
    }

    Ok(manifest_response(rewritten))
}
