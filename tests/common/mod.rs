//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use service_template::config::{AppConfig, ListenerConfig};
use service_template::App;

/// Loopback, ephemeral port, instant mail delivery.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.listener = ListenerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..ListenerConfig::default()
    };
    config.email.send_delay_ms = 0;
    config
}

/// Start an app on an ephemeral port.
pub async fn start_app(config: AppConfig) -> (App, SocketAddr) {
    let app = App::new(config);
    let addr = app.start().await.expect("app failed to start");
    (app, addr)
}

pub fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{addr}{path}")
}

pub fn registration(email: &str) -> serde_json::Value {
    serde_json::json!({
        "firstname": "Ada",
        "lastname": "Lovelace",
        "email": email,
        "password": "correct-horse-battery",
        "phone": "+44 20 7946 0000"
    })
}

/// Poll `check` until it returns true or `timeout` elapses.
pub async fn wait_for<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
