use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    RedisUrl,
    AmqpUrl,
    MinioUrl,
    MinioAccessKey,
    MinioSecretKey,
    PendingBucket,
    StreamingBucket,
    UriSecret,
    SignatureTtl,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::RedisUrl => "REDIS_URL",
            EnvKey::AmqpUrl => "AMQP_URL",
            EnvKey::MinioUrl => "MINIO_ENDPOINT",
            EnvKey::MinioAccessKey => "AWS_ACCESS_KEY_ID",
            EnvKey::MinioSecretKey => "AWS_SECRET_ACCESS_KEY",
            EnvKey::PendingBucket => "PENDING_BUCKET",
            EnvKey::StreamingBucket => "STREAMING_BUCKET",
            EnvKey::UriSecret => "URI_SIGNATURE_SECRET",
            EnvKey::SignatureTtl => "SIGNATURE_TTL_SECONDS",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
