use serde::{Deserialize, Serialize};

/// Queue message handed from the ingest dispatcher to the transcode worker.
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscodeJob {
    pub upload_id: String,
    pub s3_key: String,
}
