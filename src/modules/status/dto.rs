use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub upload_id: String,
    pub status: String,
    pub available_resolutions: Vec<i32>,
}
