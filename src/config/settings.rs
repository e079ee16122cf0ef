use crate::config::env::{self, EnvKey};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub redis_url: String,
    pub amqp_url: String,
    pub minio_url: String,
    pub minio_access_key: String,
    pub minio_secret_key: String,
    pub pending_bucket: String,
    pub streaming_bucket: String,
    pub uri_secret: String,
    /// Lifetime of segment signatures, in seconds.
    pub signature_ttl: i64,
}

impl AppConfig {
    pub fn new() -> Result<Self, std::env::VarError> {
        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 3000),
            redis_url: env::get(EnvKey::RedisUrl)?,
            amqp_url: env::get(EnvKey::AmqpUrl)?,
            minio_url: env::get(EnvKey::MinioUrl)?,
            minio_access_key: env::get(EnvKey::MinioAccessKey)?,
            minio_secret_key: env::get(EnvKey::MinioSecretKey)?,
            pending_bucket: env::get(EnvKey::PendingBucket)?,
            streaming_bucket: env::get(EnvKey::StreamingBucket)?,
            uri_secret: env::get(EnvKey::UriSecret)?,
            signature_ttl: env::get_parsed(EnvKey::SignatureTtl, 1800),
        })
    }
}
