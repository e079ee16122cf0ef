use std::time::Duration;

use anyhow::{Context, Result};
use aws_sdk_s3::config::{BehaviorVersion, Builder, Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{Client, error::SdkError};
use bytes::Bytes;
use tracing::info;

#[derive(Clone)]
pub struct StorageService {
    pub client: Client,
    pub pending_bucket: String,
    pub streaming_bucket: String,
}

impl StorageService {
    pub async fn new(
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
        pending_bucket: &str,
        streaming_bucket: &str,
    ) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "static");

        let config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .endpoint_url(endpoint)
            .credentials_provider(credentials)
            .force_path_style(true) // Required for MinIO
            .build();

        let client = Client::from_conf(config);

        info!("Connected to S3 (MinIO) at {}", endpoint);

        Self {
            client,
            pending_bucket: pending_bucket.to_string(),
            streaming_bucket: streaming_bucket.to_string(),
        }
    }

    /// Create the pending and streaming buckets if they do not exist yet.
    pub async fn ensure_buckets(&self) -> Result<()> {
        for bucket in [&self.pending_bucket, &self.streaming_bucket] {
            match self.client.head_bucket().bucket(bucket).send().await {
                Ok(_) => {
                    info!("Bucket '{}' already exists", bucket);
                }
                Err(SdkError::ServiceError(e)) if e.err().is_not_found() => {
                    self.client
                        .create_bucket()
                        .bucket(bucket)
                        .send()
                        .await
                        .with_context(|| format!("Failed to create bucket '{}'", bucket))?;
                    info!("Bucket '{}' created", bucket);
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to check bucket '{}'", bucket));
                }
            }
        }
        Ok(())
    }

    /// Time-limited write URL for a direct client upload into the pending bucket.
    pub async fn presigned_put_url(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String> {
        let presigned = self
            .client
            .put_object()
            .bucket(&self.pending_bucket)
            .key(key)
            .content_type(content_type)
            .presigned(PresigningConfig::expires_in(expires_in)?)
            .await?;

        Ok(presigned.uri().to_string())
    }

    /// Time-limited read URL for the pending object, used as the encoder input.
    pub async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> Result<String> {
        let presigned = self
            .client
            .get_object()
            .bucket(&self.pending_bucket)
            .key(key)
            .presigned(PresigningConfig::expires_in(expires_in)?)
            .await?;

        Ok(presigned.uri().to_string())
    }

    pub async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to fetch s3://{}/{}", bucket, key))?;

        let data = resp.body.collect().await?.into_bytes();
        Ok(data)
    }

    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .with_context(|| format!("Failed to upload s3://{}/{}", bucket, key))?;

        Ok(())
    }

    pub async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let resp = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .send()
            .await
            .with_context(|| format!("Failed to list s3://{}/{}", bucket, prefix))?;

        let keys = resp
            .contents()
            .iter()
            .filter_map(|obj| obj.key().map(|k| k.to_string()))
            .collect();

        Ok(keys)
    }

    /// Deleting a key that no longer exists succeeds, so repeated cleanup of
    /// the same pending object is safe.
    pub async fn delete_pending(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.pending_bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to delete s3://{}/{}", self.pending_bucket, key))?;

        Ok(())
    }
}
