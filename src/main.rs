use dotenvy::dotenv;
use tracing::info;

mod app;
mod common;
mod config;
mod docs;
mod infrastructure;
mod modules;
mod routes;
mod state;
mod workers;

use config::settings::AppConfig;
use infrastructure::queue::rabbitmq::RabbitMqService;
use infrastructure::redis::client::RedisService;
use infrastructure::storage::s3::StorageService;
use state::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting server...");

    let config = AppConfig::new().expect("Missing required environment variables");
    let server_port = config.server_port;

    let redis = RedisService::new(&config.redis_url)
        .await
        .expect("Failed to connect to Redis");

    let storage = StorageService::new(
        &config.minio_url,
        &config.minio_access_key,
        &config.minio_secret_key,
        &config.pending_bucket,
        &config.streaming_bucket,
    )
    .await;
    storage
        .ensure_buckets()
        .await
        .expect("Failed to ensure buckets");

    let queue = RabbitMqService::new(&config.amqp_url)
        .await
        .expect("Failed to connect to RabbitMQ");

    let state = AppState::new(config, redis, storage, queue);

    // In-process transcode worker, sharing the same clients as the API.
    tokio::spawn(workers::transcoder::start_transcoder_worker(state.clone()));

    let app = app::create_app(state).await;

    let addr = format!("0.0.0.0:{}", server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    info!("Server running on http://{}", addr);

    axum::serve(listener, app).await.unwrap();
}
