//! Cross-origin policy.
//!
//! # Responsibilities
//! - Allow requests whose `Origin` is on the environment's allowlist
//! - Allow credentialed requests (cookies, auth headers)
//!
//! # Design Decisions
//! - A trailing `/` on the request origin is ignored
//! - Requests without an `Origin` header are not cross-origin and pass
//!   untouched; disallowed origins simply get no CORS headers

use std::collections::HashSet;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::{CorsConfig, Environment};

/// Origins accepted in one environment.
#[derive(Debug, Clone, Default)]
pub struct OriginAllowlist {
    origins: HashSet<String>,
}

impl OriginAllowlist {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            origins: origins
                .into_iter()
                .map(|origin| normalise(origin.as_ref()).to_string())
                .collect(),
        }
    }

    pub fn for_environment(config: &CorsConfig, environment: Environment) -> Self {
        Self::new(config.origins_for(environment))
    }

    pub fn allows(&self, origin: &str) -> bool {
        self.origins.contains(normalise(origin))
    }
}

fn normalise(origin: &str) -> &str {
    origin.strip_suffix('/').unwrap_or(origin)
}

pub fn cors_layer(allowlist: OriginAllowlist) -> CorsLayer {
    let allowlist = Arc::new(allowlist);
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|origin| allowlist.allows(origin))
                .unwrap_or(false)
        }))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}
