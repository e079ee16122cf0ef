use anyhow::Context;

use super::dto::StatusResponse;
use crate::common::error::ApiError;
use crate::state::AppState;

/// Derives a job's status from the object keys present under its streaming
/// prefix. The job is ready once the master manifest exists; the available
/// resolutions are the variants whose sub-manifest was uploaded.
///
/// A failed job leaves no marker object behind, so without the pub/sub event
/// it projects as `processing` for as long as any partial output exists (and
/// as unknown when nothing was uploaded at all).
pub fn project_from_keys(upload_id: &str, prefix: &str, keys: &[String]) -> StatusResponse {
    let names: Vec<&str> = keys
        .iter()
        .filter_map(|k| k.strip_prefix(prefix))
        .collect();

    let ready = names.iter().any(|n| *n == "master.m3u8");

    let mut resolutions = Vec::new();
    if ready {
        for name in &names {
            // e.g. "360p/playlist.m3u8"
            let Some((dir, file)) = name.split_once('/') else {
                continue;
            };
            if file != "playlist.m3u8" {
                continue;
            }
            if let Some(res) = dir.strip_suffix('p').and_then(|r| r.parse::<i32>().ok()) {
                resolutions.push(res);
            }
        }
        resolutions.sort_unstable();
    }

    StatusResponse {
        upload_id: upload_id.to_string(),
        status: if ready { "ready" } else { "processing" }.to_string(),
        available_resolutions: resolutions,
    }
}

/// Poll-path status: cached projection if present, otherwise recomputed from
/// a storage listing and re-cached in the background. Cheap and not
/// security-sensitive, so a short TTL is fine.
pub async fn get_status(state: &AppState, upload_id: &str) -> Result<StatusResponse, ApiError> {
    let cache_key = format!("upload_status:{}", upload_id);

    if let Some(cached) = state.redis.cache_get(&cache_key).await {
        if let Ok(response) = serde_json::from_str::<StatusResponse>(&cached) {
            return Ok(response);
        }
    }

    let prefix = format!("videos/{}/", upload_id);
    let keys = state
        .storage
        .list_keys(&state.config.streaming_bucket, &prefix)
        .await
        .context("Failed to query upload status")?;

    if keys.is_empty() {
        return Err(ApiError::NotFound("Upload ID not found".to_string()));
    }

    let response = project_from_keys(upload_id, &prefix, &keys);

    if let Ok(json) = serde_json::to_string(&response) {
        state
            .redis
            .cache_put_detached(cache_key, json, state.config.signature_ttl as u64);
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(prefix: &str, names: &[&str]) -> Vec<String> {
        names.iter().map(|n| format!("{}{}", prefix, n)).collect()
    }

    #[test]
    fn complete_job_projects_ready_with_sorted_resolutions() {
        let prefix = "videos/abc123/";
        let listing = keys(
            prefix,
            &[
                "master.m3u8",
                "720p/playlist.m3u8",
                "720p/seg_000.ts",
                "360p/playlist.m3u8",
                "360p/seg_000.ts",
                "1080p/playlist.m3u8",
                "480p/playlist.m3u8",
            ],
        );

        let status = project_from_keys("abc123", prefix, &listing);
        assert_eq!(status.upload_id, "abc123");
        assert_eq!(status.status, "ready");
        assert_eq!(status.available_resolutions, vec![360, 480, 720, 1080]);
    }

    #[test]
    fn missing_master_manifest_projects_processing() {
        let prefix = "videos/abc123/";
        let listing = keys(prefix, &["360p/playlist.m3u8", "360p/seg_000.ts"]);

        let status = project_from_keys("abc123", prefix, &listing);
        assert_eq!(status.status, "processing");
        assert!(status.available_resolutions.is_empty());
    }

    #[test]
    fn segment_only_keys_do_not_count_as_variants() {
        let prefix = "videos/abc123/";
        let listing = keys(prefix, &["master.m3u8", "720p/seg_000.ts", "720p/seg_001.ts"]);

        let status = project_from_keys("abc123", prefix, &listing);
        assert_eq!(status.status, "ready");
        assert!(status.available_resolutions.is_empty());
    }

    #[test]
    fn malformed_resolution_dirs_are_skipped() {
        let prefix = "videos/abc123/";
        let listing = keys(
            prefix,
            &["master.m3u8", "raw/playlist.m3u8", "xp/playlist.m3u8", "480p/playlist.m3u8"],
        );

        let status = project_from_keys("abc123", prefix, &listing);
        assert_eq!(status.available_resolutions, vec![480]);
    }
}
