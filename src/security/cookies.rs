//! Cookie parsing.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;

/// Parse the `Cookie` header once and expose it as a [`CookieJar`]
/// request extension.
pub async fn parse_cookies(mut request: Request, next: Next) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    request.extensions_mut().insert(jar);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request as HttpRequest};
    use axum::routing::get;
    use axum::{Extension, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_cookies_are_parsed_into_extension() {
        let router = Router::new()
            .route(
                "/",
                get(|Extension(jar): Extension<CookieJar>| async move {
                    jar.get("theme").map(|c| c.value().to_string()).unwrap_or_default()
                }),
            )
            .layer(axum::middleware::from_fn(parse_cookies));

        let response = router
            .oneshot(
                HttpRequest::get("/")
                    .header(header::COOKIE, "theme=dark; sid=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"dark");
    }
}
