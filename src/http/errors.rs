//! Final error handling stages.
//!
//! # Responsibilities
//! - JSON 404 for unmatched routes
//! - Turn handler panics into a 500 without killing the connection
//! - Rewrite non-JSON error responses from inner layers (405, 408, 413)
//!   into the JSON error shape
//!
//! # Design Decisions
//! - Panic detail is shown outside production only
//! - Headers from the original error response (e.g. `Allow`) are kept

use std::any::Any;

use async_trait::async_trait;
use axum::http::{header, HeaderValue, Uri};
use axum::response::{IntoResponse, Response};
use axum::middleware;
use tower_http::catch_panic::CatchPanicLayer;

use crate::bootstrap::ErrorHandlingSetup;
use crate::config::Environment;
use crate::events::bus::panic_message;
use crate::http::error::AppError;
use crate::http::surface::RequestSurface;
use crate::registry::BoxError;

pub struct ErrorHandlingManager {
    environment: Environment,
}

impl ErrorHandlingManager {
    pub fn new(environment: Environment) -> Self {
        Self { environment }
    }
}

#[async_trait]
impl ErrorHandlingSetup for ErrorHandlingManager {
    async fn setup_error_handling(&self, surface: &mut RequestSurface) -> Result<(), BoxError> {
        surface.add_routes("not-found", |router| router.fallback(not_found));

        let environment = self.environment;
        surface.add_error_handler("panic-catcher", move |router| {
            router.layer(CatchPanicLayer::custom(move |panic| panic_response(panic, environment)))
        });

        surface.add_error_handler("error-normaliser", |router| {
            router.layer(middleware::map_response(normalise_error_response))
        });

        Ok(())
    }
}

async fn not_found(uri: Uri) -> AppError {
    AppError::not_found(format!("Route {} not found", uri.path()))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>, environment: Environment) -> Response {
    let detail = panic_message(&*panic);
    tracing::error!(panic = %detail, "Request handler panicked");

    let message = if environment.is_production() {
        "Something went wrong".to_string()
    } else {
        detail
    };
    AppError::internal(message).into_response()
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

async fn normalise_error_response(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || is_json(&response) {
        return response;
    }

    let (parts, _) = response.into_parts();
    let mut normalised = AppError::from_status(status).into_response();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            normalised.headers_mut().append(name.clone(), value.clone());
        }
    }
    normalised
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    normalised
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    async fn explode() -> &'static str {
        panic!("database exploded")
    }

    async fn router(environment: Environment) -> axum::Router {
        let mut surface = RequestSurface::new();
        surface.add_routes("test", |router| {
            router
                .route("/boom", get(explode))
                .route("/only-get", get(|| async { "ok" }))
                .route("/teapot", get(|| async { (StatusCode::IM_A_TEAPOT, "short and stout") }))
        });
        ErrorHandlingManager::new(environment)
            .setup_error_handling(&mut surface)
            .await
            .unwrap();
        surface.into_router()
    }

    async fn call(router: axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value, Response) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap();
        (status, json, Response::from_parts(parts, Body::empty()))
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let (status, json, _) = call(
            router(Environment::Development).await,
            Request::get("/nope").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["status"], false);
        assert_eq!(json["message"], "Route /nope not found");
    }

    #[tokio::test]
    async fn test_panic_detail_outside_production() {
        let (status, json, _) = call(
            router(Environment::Development).await,
            Request::get("/boom").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "database exploded");
    }

    #[tokio::test]
    async fn test_panic_detail_hidden_in_production() {
        let (status, json, _) = call(
            router(Environment::Production).await,
            Request::get("/boom").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "Something went wrong");
    }

    #[tokio::test]
    async fn test_method_not_allowed_is_normalised() {
        let (status, json, response) = call(
            router(Environment::Development).await,
            Request::post("/only-get").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(json["message"], "Method Not Allowed");
        assert!(response.headers().contains_key(header::ALLOW));
    }

    #[tokio::test]
    async fn test_plain_text_errors_become_json() {
        let (status, json, _) = call(
            router(Environment::Development).await,
            Request::get("/teapot").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::IM_A_TEAPOT);
        assert_eq!(json, serde_json::json!({ "status": false, "message": "I'm a teapot" }));
    }
}
