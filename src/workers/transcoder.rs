use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::future::join_all;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicQosOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::infrastructure::queue::rabbitmq::TRANSCODE_QUEUE;
use crate::modules::status::bus::{self, STATUS_FAILED, STATUS_PROCESSING, STATUS_READY};
use crate::modules::upload::events::TranscodeJob;
use crate::state::AppState;

/// Fixed rendition ladder, ascending.
pub const VARIANTS: [u32; 4] = [360, 480, 720, 1080];

const SOURCE_URL_VALIDITY: Duration = Duration::from_secs(60 * 60);

fn variant_info(resolution: u32) -> (u32, &'static str) {
    match resolution {
        360 => (800_000, "640x360"),
        480 => (1_400_000, "854x480"),
        720 => (2_800_000, "1280x720"),
        _ => (5_000_000, "1920x1080"),
    }
}

/// Master manifest over the given variants, in the order given. Callers pass
/// the fixed ladder so the output is deterministic for a job.
pub fn build_master_manifest(resolutions: &[u32]) -> String {
    let mut lines = vec!["#EXTM3U".to_string(), "#EXT-X-VERSION:3".to_string()];
    for res in resolutions {
        let (bandwidth, dims) = variant_info(*res);
        lines.push(format!(
            "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={}",
            bandwidth, dims
        ));
        lines.push(format!("{}p/playlist.m3u8", res));
    }
    lines.join("\n")
}

/// Consumes the transcode queue one job at a time; parallelism lives inside a
/// job (per-variant encodes and uploads), not across jobs, so a backlog never
/// oversubscribes the encode hardware.
pub async fn start_transcoder_worker(state: AppState) {
    info!("Starting transcoder worker...");

    let channel = state.queue.get_channel().await;
    let channel_guard = channel.lock().await;

    let _queue = channel_guard
        .queue_declare(
            TRANSCODE_QUEUE,
            QueueDeclareOptions {
                durable: true,
                ..QueueDeclareOptions::default()
            },
            FieldTable::default(),
        )
        .await
        .expect("Failed to declare queue");

    channel_guard
        .basic_qos(1, BasicQosOptions::default())
        .await
        .expect("Failed to set prefetch");

    let mut consumer = channel_guard
        .basic_consume(
            TRANSCODE_QUEUE,
            "transcoder_worker",
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await
        .expect("Failed to create consumer");

    drop(channel_guard);

    info!("Transcoder worker listening on '{}'", TRANSCODE_QUEUE);

    while let Some(delivery) = consumer.next().await {
        if let Ok(delivery) = delivery {
            match serde_json::from_slice::<TranscodeJob>(&delivery.data) {
                Ok(job) => {
                    info!("Received transcode job for upload_id: {}", job.upload_id);
                    if let Err(e) = process_job(&state, &job).await {
                        // Not retried here; redelivering the ingest event is
                        // the external retry path.
                        error!("Transcode job {} failed: {:#}", job.upload_id, e);
                    } else {
                        info!("Transcode job {} completed", job.upload_id);
                    }
                }
                Err(e) => {
                    error!("Failed to parse transcode job: {}", e);
                }
            }

            if let Err(e) = delivery.ack(BasicAckOptions::default()).await {
                error!("Failed to ack message: {}", e);
            }
        }
    }
}

/// One job end to end: encode, upload, publish terminal status, clean up.
/// The terminal token goes out only after every upload is durable, and the
/// pending source object is deleted exactly once whatever the outcome.
async fn process_job(state: &AppState, job: &TranscodeJob) -> Result<()> {
    publish_status(state, &job.upload_id, STATUS_PROCESSING).await;

    let result = run_pipeline(state, job).await;

    let token = if result.is_ok() {
        STATUS_READY
    } else {
        STATUS_FAILED
    };
    publish_status(state, &job.upload_id, token).await;

    // Cleanup is deliberately outside the pipeline: it must run on both
    // outcomes, and a cleanup failure never changes the job's result.
    if let Err(e) = state.storage.delete_pending(&job.s3_key).await {
        warn!("Cleanup of pending object '{}' failed: {:#}", job.s3_key, e);
    }

    result
}

async fn run_pipeline(state: &AppState, job: &TranscodeJob) -> Result<()> {
    // The encoder reads straight from storage over an expiring URL; nothing
    // is downloaded up front.
    let source_url = state
        .storage
        .presigned_get_url(&job.s3_key, SOURCE_URL_VALIDITY)
        .await
        .context("Failed to presign source object")?;

    let workspace = tempfile::tempdir().context("Failed to create encode workspace")?;

    // One task per variant, each in its own subdirectory.
    let mut encodes = Vec::new();
    for res in VARIANTS {
        let url = source_url.clone();
        let out_dir = workspace.path().join(format!("{}p", res));
        encodes.push(tokio::spawn(
            async move { encode_variant(&url, res, &out_dir).await },
        ));
    }

    let mut failed = Vec::new();
    for (res, joined) in VARIANTS.iter().zip(join_all(encodes).await) {
        match joined {
            Ok(Ok(())) => info!("Variant {}p encoded for {}", res, job.upload_id),
            Ok(Err(e)) => {
                error!("Variant {}p failed for {}: {:#}", res, job.upload_id, e);
                failed.push(*res);
            }
            Err(e) => {
                error!("Variant {}p task panicked for {}: {}", res, job.upload_id, e);
                failed.push(*res);
            }
        }
    }

    // No partial publishes: a master manifest may only ever reference fully
    // uploaded variants, so any failure aborts before anything is uploaded.
    if !failed.is_empty() {
        bail!("variant encode failed for: {:?}", failed);
    }

    upload_artifacts(state, job, workspace.path()).await?;

    let master = build_master_manifest(&VARIANTS);
    let master_key = format!("videos/{}/master.m3u8", job.upload_id);
    state
        .storage
        .put_object(
            &state.config.streaming_bucket,
            &master_key,
            Bytes::from(master),
            "application/vnd.apple.mpegurl",
        )
        .await
        .context("Failed to upload master manifest")?;

    info!("Uploaded master manifest for {}", job.upload_id);
    Ok(())
}

async fn encode_variant(source_url: &str, resolution: u32, out_dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(out_dir)
        .await
        .context("Failed to create variant directory")?;

    let playlist = out_dir.join("playlist.m3u8");
    let segments = out_dir.join("seg_%03d.ts");

    let status = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error"])
        .arg("-i")
        .arg(source_url)
        .arg("-vf")
        .arg(format!("scale=-2:{}", resolution))
        .args(["-c:v", "libx264", "-preset", "fast"])
        .args(["-g", "48", "-keyint_min", "48"])
        .args(["-c:a", "aac", "-b:a", "128k"])
        .args(["-f", "hls", "-hls_time", "6", "-hls_playlist_type", "vod"])
        .arg("-hls_segment_filename")
        .arg(&segments)
        .arg(&playlist)
        .status()
        .await
        .context("Failed to spawn ffmpeg")?;

    if !status.success() {
        bail!("ffmpeg exited with {} for {}p", status, resolution);
    }

    Ok(())
}

/// Uploads every variant artifact, one task per file, and joins them all
/// before the caller is allowed to write the master manifest.
async fn upload_artifacts(state: &AppState, job: &TranscodeJob, workspace: &Path) -> Result<()> {
    let mut uploads = Vec::new();

    for res in VARIANTS {
        let dir = workspace.join(format!("{}p", res));
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("Failed to read output dir for {}p", res))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .context("Failed to walk variant output")?
        {
            let path = entry.path();
            let filename = entry.file_name().to_string_lossy().into_owned();
            let key = format!("videos/{}/{}p/{}", job.upload_id, res, filename);
            let storage = state.storage.clone();
            let bucket = state.config.streaming_bucket.clone();

            uploads.push(tokio::spawn(async move {
                let data = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("Failed to read artifact '{}'", path.display()))?;
                let content_type = mime_guess::from_path(&path).first_or_octet_stream();
                storage
                    .put_object(&bucket, &key, Bytes::from(data), content_type.as_ref())
                    .await
            }));
        }
    }

    for joined in join_all(uploads).await {
        joined.map_err(|e| anyhow!("upload task panicked: {}", e))??;
    }

    Ok(())
}

/// Bus failures are logged, not fatal: subscribers that miss a token still
/// have the poll path.
async fn publish_status(state: &AppState, upload_id: &str, token: &str) {
    if let Err(e) = bus::publish(&state.redis, upload_id, token).await {
        warn!("Failed to publish '{}' for {}: {:#}", token, upload_id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn master_manifest_lists_variants_in_given_order() {
        let manifest = build_master_manifest(&VARIANTS);
        let resource_lines: Vec<&str> = manifest
            .lines()
            .filter(|l| !l.starts_with('#'))
            .collect();

        assert_eq!(
            resource_lines,
            vec![
                "360p/playlist.m3u8",
                "480p/playlist.m3u8",
                "720p/playlist.m3u8",
                "1080p/playlist.m3u8"
            ]
        );
    }

    #[test]
    fn master_manifest_is_deterministic() {
        assert_eq!(build_master_manifest(&VARIANTS), build_master_manifest(&VARIANTS));
    }

    #[test]
    fn master_manifest_carries_bandwidth_and_dimensions() {
        let manifest = build_master_manifest(&VARIANTS);
        assert!(manifest.starts_with("#EXTM3U\n#EXT-X-VERSION:3\n"));
        assert!(manifest.contains("#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360"));
        assert!(manifest.contains("#EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080"));
    }
}
