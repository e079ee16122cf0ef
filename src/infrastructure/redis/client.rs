use redis::{AsyncCommands, Client, aio::MultiplexedConnection, aio::PubSub};
use tracing::{info, warn};

#[derive(Clone)]
pub struct RedisService {
    client: Client,
}

impl RedisService {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = Client::open(connection_string)?;

        // Test connection
        let _conn = client.get_multiplexed_async_connection().await?;

        info!("Connected to Redis");
        Ok(Self { client })
    }

    pub async fn get_conn(&self) -> Result<MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    /// Dedicated connection for pub/sub; the multiplexed one cannot subscribe.
    pub async fn get_pubsub(&self) -> Result<PubSub, redis::RedisError> {
        self.client.get_async_pubsub().await
    }

    /// Cache read. Backend failures are non-fatal: log and let the caller
    /// fall through to the authoritative path.
    pub async fn cache_get(&self, key: &str) -> Option<String> {
        let mut conn = match self.get_conn().await {
            Ok(c) => c,
            Err(e) => {
                warn!("Cache read skipped, redis unavailable: {}", e);
                return None;
            }
        };

        match conn.get::<_, Option<String>>(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Cache read for '{}' failed: {}", key, e);
                None
            }
        }
    }

    /// Detached cache write, decoupled from the request that produced the
    /// value. The response has already been sent by the time this runs;
    /// failures are logged and otherwise ignored.
    pub fn cache_put_detached(&self, key: String, value: String, ttl_seconds: u64) {
        let redis = self.clone();
        tokio::spawn(async move {
            let mut conn = match redis.get_conn().await {
                Ok(c) => c,
                Err(e) => {
                    warn!("Cache write skipped, redis unavailable: {}", e);
                    return;
                }
            };

            if let Err(e) = conn.set_ex::<_, _, ()>(&key, value, ttl_seconds).await {
                warn!("Cache write for '{}' failed: {}", key, e);
            }
        });
    }
}
