use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::upload::handler::create_upload_slot,
        crate::modules::upload::handler::s3_webhook,
        crate::modules::status::handler::status_poll,
        crate::modules::status::handler::status_events,
        crate::modules::delivery::handler::master_manifest,
        crate::modules::delivery::handler::media_manifest,
    ),
    components(
        schemas(
            crate::modules::upload::dto::UploadSlotResponse,
            crate::modules::status::dto::StatusResponse,
        )
    ),
    tags(
        (name = "Upload", description = "Upload handshake and ingest events"),
        (name = "Status", description = "Transcode job status"),
        (name = "Delivery", description = "Signed manifest delivery")
    )
)]
pub struct ApiDoc;
