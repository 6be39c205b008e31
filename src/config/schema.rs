//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Deployment environment; selects the CORS allowlist and error detail.
    pub environment: Environment,

    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// Request limits applied by the pipeline.
    pub http: HttpConfig,

    /// Cross-origin allowlists.
    pub cors: CorsConfig,

    /// Idempotency guard on mutating auth routes.
    pub rate_limit: RateLimitConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub email: EmailConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "test" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port; 0 asks the OS for a free one.
    pub port: u16,

    /// How long `stop` waits for in-flight requests before aborting them.
    pub shutdown_timeout_ms: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_ms: 10_000,
        }
    }
}

impl ListenerConfig {
    /// `host:port`, bracketing IPv6 hosts.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Maximum accepted request body, in bytes.
    pub body_limit_bytes: usize,

    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            body_limit_bytes: 1024 * 1024,
            request_timeout_secs: 30,
        }
    }
}

/// Allowed browser origins per environment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Used for every environment except production.
    pub staging_origins: Vec<String>,

    pub production_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            staging_origins: vec!["http://staging.com".to_string()],
            production_origins: vec!["https://production.com".to_string()],
        }
    }
}

impl CorsConfig {
    /// The allowlist that applies in `environment`.
    pub fn origins_for(&self, environment: Environment) -> &[String] {
        if environment.is_production() {
            &self.production_origins
        } else {
            &self.staging_origins
        }
    }
}

/// Fixed-window request limiter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,

    /// Window length in milliseconds.
    pub window_ms: u64,

    /// Requests allowed per key per window.
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_ms: 10_000,
            max_requests: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON in production, pretty otherwise.
    #[default]
    Auto,
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub log_filter: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "service_template=info,tower_http=info".to_string(),
            log_format: LogFormat::Auto,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Simulated provider latency in milliseconds.
    pub send_delay_ms: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self { send_delay_ms: 1000 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.listener.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.http.body_limit_bytes, 1024 * 1024);
        assert_eq!(config.rate_limit.window_ms, 10_000);
        assert_eq!(config.rate_limit.max_requests, 10);
    }

    #[test]
    fn test_origins_follow_environment() {
        let cors = CorsConfig::default();
        assert_eq!(cors.origins_for(Environment::Production), ["https://production.com"]);
        assert_eq!(cors.origins_for(Environment::Staging), ["http://staging.com"]);
        assert_eq!(cors.origins_for(Environment::Development), ["http://staging.com"]);
    }

    #[test]
    fn test_ipv6_bind_address() {
        let listener = ListenerConfig {
            host: "::1".to_string(),
            port: 3000,
            ..ListenerConfig::default()
        };
        assert_eq!(listener.bind_address(), "[::1]:3000");
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!("PRODUCTION".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("dev".parse::<Environment>(), Ok(Environment::Development));
        assert!("qa".parse::<Environment>().is_err());
    }
}
