use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadSlotResponse {
    pub presigned_url: String,
    pub upload_id: String,
    pub s3_key: String,
}

/// S3/MinIO bucket-notification payload, reduced to the fields the dispatcher
/// reads. Everything is optional so shape errors surface as a 422 instead of
/// a deserialization 400.
#[derive(Debug, Deserialize, ToSchema)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct S3EventRecord {
    pub s3: Option<S3Entity>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct S3Entity {
    pub object: Option<S3Object>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct S3Object {
    pub key: Option<String>,
}
