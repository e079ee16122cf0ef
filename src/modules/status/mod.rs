use axum::Router;
use axum::routing::get;

use crate::state::AppState;

pub mod bus;
pub mod dto;
pub mod handler;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status/{upload_id}", get(handler::status_poll))
        .route("/status/{upload_id}/events", get(handler::status_events))
}
