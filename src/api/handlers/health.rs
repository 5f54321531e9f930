use axum::{
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::GIT_COMMIT_HASH;

/// Liveness probe reporting which build is running.
pub async fn health() -> impl IntoResponse {
    let short_hash = GIT_COMMIT_HASH.get(..7).unwrap_or_default();
    let app = format!(
        "{}:{}:{short_hash}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    // Package name and version are static ASCII; a non-printable value can
    // only come from an odd commit hash, in which case the header is skipped.
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&app) {
        headers.insert("X-App", value);
    }

    (
        headers,
        Json(json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "build": GIT_COMMIT_HASH,
        })),
    )
}
