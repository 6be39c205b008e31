//! Security response headers.
//!
//! # Responsibilities
//! - Add the usual hardening headers to every response
//!
//! # Design Decisions
//! - Headers a handler already set are left alone
//! - Values mirror common browser-hardening defaults

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

/// Header/value pairs applied to every response.
pub const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("content-security-policy", "default-src 'self';base-uri 'self';font-src 'self' https: data:;form-action 'self';frame-ancestors 'self';img-src 'self' data:;object-src 'none';script-src 'self';script-src-attr 'none';style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=31536000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

type HeaderLayer = SetResponseHeaderLayer<HeaderValue>;

/// Build one layer per entry in [`SECURITY_HEADERS`].
pub fn security_headers() -> Vec<HeaderLayer> {
    SECURITY_HEADERS
        .iter()
        .map(|&(name, value)| {
            SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            )
        })
        .collect()
}

/// Wrap `router` in every security header layer.
pub fn apply_security_headers(router: Router) -> Router {
    security_headers()
        .into_iter()
        .fold(router, |router, layer| router.layer(layer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::routing::get;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_headers_are_added_but_not_overridden() {
        let router = Router::new().route(
            "/",
            get(|| async { ([(header::X_FRAME_OPTIONS, "DENY")], "ok") }),
        );
        let response = apply_security_headers(router)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["referrer-policy"], "no-referrer");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    }
}
