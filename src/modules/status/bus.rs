use futures_util::{Stream, StreamExt};
use redis::AsyncCommands;

use crate::infrastructure::redis::client::RedisService;

pub const STATUS_PROCESSING: &str = "processing";
pub const STATUS_READY: &str = "ready";
pub const STATUS_FAILED: &str = "failed";

/// Per-job pub/sub channel. Tokens published here reach every live
/// subscriber; there is no replay, late subscribers fall back to the poll
/// endpoint.
pub fn channel(upload_id: &str) -> String {
    format!("job_status:{}", upload_id)
}

pub fn is_terminal(token: &str) -> bool {
    token == STATUS_READY || token == STATUS_FAILED
}

pub async fn publish(redis: &RedisService, upload_id: &str, token: &str) -> anyhow::Result<()> {
    let mut conn = redis.get_conn().await?;
    conn.publish::<_, _, ()>(channel(upload_id), token).await?;
    Ok(())
}

/// Owned stream of status tokens for one job. Dropping the stream tears down
/// the underlying subscription, so a disconnecting client cannot leak it.
pub async fn subscribe(
    redis: &RedisService,
    upload_id: &str,
) -> anyhow::Result<impl Stream<Item = String> + use<>> {
    let mut pubsub = redis.get_pubsub().await?;
    pubsub.subscribe(channel(upload_id)).await?;

    let stream = pubsub
        .into_on_message()
        .filter_map(|msg| async move { msg.get_payload::<String>().ok() });

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_is_keyed_by_job() {
        assert_eq!(channel("abc123"), "job_status:abc123");
        assert_ne!(channel("a"), channel("b"));
    }

    #[test]
    fn only_ready_and_failed_are_terminal() {
        assert!(is_terminal(STATUS_READY));
        assert!(is_terminal(STATUS_FAILED));
        assert!(!is_terminal(STATUS_PROCESSING));
        assert!(!is_terminal("queued"));
        assert!(!is_terminal(""));
    }
}
