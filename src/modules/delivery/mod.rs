use axum::Router;
use axum::routing::get;

use crate::state::AppState;

pub mod cache;
pub mod handler;
pub mod rewrite;
pub mod signer;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/manifest/{upload_id}", get(handler::master_manifest))
        .route(
            "/manifest/{upload_id}/{resolution}",
            get(handler::media_manifest),
        )
}
