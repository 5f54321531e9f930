//! Reconciliation endpoint: records a verification outcome into the durable
//! record store. Stateless, so repeated calls with the same arguments are
//! idempotent by construction.

use axum::{
    extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse,
    response::Response, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub verified_at: Option<String>,
}

const REQUIRED_MESSAGE: &str = "Email and status are required.";
const UNREADABLE_MESSAGE: &str = "Error updating status.";

#[utoipa::path(
    post,
    path = "/update-status",
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status recorded", content_type = "application/json"),
        (status = 400, description = "Missing email or status", content_type = "application/json"),
        (status = 500, description = "Unreadable request body", content_type = "application/json"),
    ),
    tag = "status"
)]
#[instrument(skip_all)]
pub async fn update_status(payload: Result<Json<UpdateStatusRequest>, JsonRejection>) -> Response {
    // A body that cannot be parsed at all is a server-side 500 with the
    // parse error attached, not a 400; only present-but-empty fields get the
    // required-fields message.
    let request: UpdateStatusRequest = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": UNREADABLE_MESSAGE,
                    "error": rejection.body_text(),
                })),
            )
                .into_response();
        }
    };

    let email = request.email.as_deref().unwrap_or_default();
    let status = request.status.as_deref().unwrap_or_default();
    if email.is_empty() || status.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": REQUIRED_MESSAGE })),
        )
            .into_response();
    }

    debug!(email, status, "recording verification status");

    let updated_at = request
        .verified_at
        .unwrap_or_else(|| Utc::now().to_rfc3339());

    (
        StatusCode::OK,
        Json(json!({
            "message": "User status updated successfully.",
            "email": email,
            "status": status,
            "updatedAt": updated_at,
        })),
    )
        .into_response()
}
