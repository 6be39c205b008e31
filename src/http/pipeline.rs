//! Default request pipeline.
//!
//! # Responsibilities
//! - Bound request bodies and request time
//! - Parse cookies, apply CORS and security headers
//! - Access logging with request ids
//!
//! # Design Decisions
//! - Stages are installed outermost first: body limits see the request
//!   before anything else, the access log sits closest to the handlers

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::bootstrap::PipelineSetup;
use crate::config::{AppConfig, Environment};
use crate::http::surface::RequestSurface;
use crate::registry::BoxError;
use crate::security::cookies::parse_cookies;
use crate::security::cors::{cors_layer, OriginAllowlist};
use crate::security::headers::apply_security_headers;

pub struct MiddlewareManager {
    body_limit: usize,
    request_timeout: Duration,
    allowlist: OriginAllowlist,
    environment: Environment,
}

impl MiddlewareManager {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            body_limit: config.http.body_limit_bytes,
            request_timeout: Duration::from_secs(config.http.request_timeout_secs),
            allowlist: OriginAllowlist::for_environment(&config.cors, config.environment),
            environment: config.environment,
        }
    }
}

#[async_trait]
impl PipelineSetup for MiddlewareManager {
    #[allow(deprecated)]
    async fn setup_pipeline(&self, surface: &mut RequestSurface) -> Result<(), BoxError> {
        let body_limit = self.body_limit;
        surface.add_layer("body-limit", move |router| {
            router
                .layer(RequestBodyLimitLayer::new(body_limit))
                .layer(DefaultBodyLimit::disable())
        });

        let timeout = self.request_timeout;
        surface.add_layer("request-timeout", move |router| router.layer(TimeoutLayer::new(timeout)));

        surface.add_layer("cookies", |router| router.layer(middleware::from_fn(parse_cookies)));

        let allowlist = self.allowlist.clone();
        surface.add_layer("cors", move |router| router.layer(cors_layer(allowlist)));

        surface.add_layer("security-headers", apply_security_headers);

        surface.add_layer("access-log", access_log);

        surface.add_routes("favicon", |router| {
            router.route("/favicon.ico", get(|| async { StatusCode::OK }))
        });

        tracing::debug!(environment = %self.environment, "Request pipeline installed");
        Ok(())
    }
}

fn access_log(router: Router) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::x_request_id()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;
    use axum::routing::post;
    use axum::Extension;
    use axum_extra::extract::cookie::CookieJar;
    use tower::ServiceExt;

    async fn surface_with(config: &AppConfig) -> Router {
        let mut surface = RequestSurface::new();
        MiddlewareManager::new(config)
            .setup_pipeline(&mut surface)
            .await
            .unwrap();
        surface.add_routes("echo", |router| {
            router.route("/echo", post(|body: String| async move { body }))
        });
        surface.into_router()
    }

    #[tokio::test]
    async fn test_stage_order() {
        let mut surface = RequestSurface::new();
        MiddlewareManager::new(&AppConfig::default())
            .setup_pipeline(&mut surface)
            .await
            .unwrap();

        let names: Vec<_> = surface.stages().iter().map(|(_, name)| *name).collect();
        assert_eq!(
            names,
            [
                "body-limit",
                "request-timeout",
                "cookies",
                "cors",
                "security-headers",
                "access-log",
                "favicon"
            ]
        );
    }

    #[tokio::test]
    async fn test_request_id_and_security_headers() {
        let router = surface_with(&AppConfig::default()).await;
        let response = router
            .oneshot(Request::post("/echo").body(Body::from("hi")).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let mut config = AppConfig::default();
        config.http.body_limit_bytes = 8;
        let router = surface_with(&config).await;

        let response = router
            .oneshot(
                Request::post("/echo")
                    .header(header::CONTENT_LENGTH, "32")
                    .body(Body::from("x".repeat(32)))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_handlers_see_parsed_cookies() {
        let mut surface = RequestSurface::new();
        MiddlewareManager::new(&AppConfig::default())
            .setup_pipeline(&mut surface)
            .await
            .unwrap();
        surface.add_routes("theme", |router| {
            router.route(
                "/theme",
                get(|Extension(jar): Extension<CookieJar>| async move {
                    jar.get("theme").map(|c| c.value().to_string()).unwrap_or_default()
                }),
            )
        });

        let response = surface
            .into_router()
            .oneshot(
                Request::get("/theme")
                    .header(header::COOKIE, "theme=dark")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"dark");
    }

    #[tokio::test]
    async fn test_favicon_is_empty_ok() {
        let router = surface_with(&AppConfig::default()).await;
        let response = router
            .oneshot(Request::get("/favicon.ico").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
