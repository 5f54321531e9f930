use utoipa::OpenApi;

use crate::api::handlers::update_status::UpdateStatusRequest;

#[derive(OpenApi)]
#[openapi(
    paths(crate::api::handlers::update_status::update_status),
    components(schemas(UpdateStatusRequest)),
    tags(
        (name = "status", description = "Verification status reconciliation")
    )
)]
pub struct ApiDoc;
