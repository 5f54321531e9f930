//! HTTP wiring for the update-status service.
//!
//! The calling page and these endpoints are served from different origins,
//! so the CORS layer answers preflights with any-origin, `Content-Type`, and
//! `POST, OPTIONS`.

use anyhow::Result;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method, Request},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod handlers;
mod openapi;

pub use openapi::ApiDoc;

fn make_span(request: &Request<Body>) -> Span {
    let path = request.extensions().get::<MatchedPath>().map_or_else(
        || request.uri().path().to_string(),
        |matched| matched.as_str().to_string(),
    );

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.path = %path
    )
}

/// Build the service router with CORS, tracing, and request-id layers.
#[must_use]
pub fn router() -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([CONTENT_TYPE])
        .allow_methods([Method::POST, Method::OPTIONS]);

    Router::new()
        .route("/update-status", post(handlers::update_status))
        .route("/health", get(handlers::health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16) -> Result<()> {
    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, router().into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use axum::http::{
        header::{ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, ORIGIN},
        StatusCode,
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn preflight_allows_any_origin() -> Result<()> {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/update-status")
            .header(ORIGIN, "https://pages.example.com")
            .header(ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())?;

        let response = router().oneshot(request).await?;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|value| value.to_str().ok()),
            Some("*")
        );
        let allowed_methods = response
            .headers()
            .get("access-control-allow-methods")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(allowed_methods.contains("POST"));
        assert!(allowed_methods.contains("OPTIONS"));
        Ok(())
    }

    #[tokio::test]
    async fn update_status_round_trip_through_router() -> Result<()> {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/update-status")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"email":"jane@example.com","status":"verified"}"#,
            ))?;

        let response = router().oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_body_reports_parse_error() -> Result<()> {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/update-status")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("not-json"))?;

        let response = router().oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body: serde_json::Value = serde_json::from_slice(&bytes)?;
        assert_eq!(body["message"], "Error updating status.");
        assert!(body["error"].is_string());
        Ok(())
    }

    #[tokio::test]
    async fn missing_fields_are_still_a_client_error() -> Result<()> {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/update-status")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"email":"jane@example.com"}"#))?;

        let response = router().oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}
