//! HTTP listener lifecycle.
//!
//! # Responsibilities
//! - Bind the configured address and serve a finished [`Router`]
//! - Track `Stopped → Starting → Running → Stopping → Stopped`
//! - Graceful stop: stop accepting, drain in-flight requests, release port
//! - Stop waiting for the drain once `shutdown_timeout_ms` has passed
//!
//! # Design Decisions
//! - start/stop are serialised by one async mutex, so overlapping calls
//!   never double-bind or double-close
//! - `stop` never fails; serve errors during drain are logged
//! - Connect info is attached so per-client middleware sees peer addresses

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::ListenerConfig;
use crate::lifecycle::Shutdown;
use crate::net::{self, ListenError};
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

struct RunningServer {
    addr: SocketAddr,
    shutdown: Shutdown,
    task: JoinHandle<io::Result<()>>,
}

/// Owns the network listener.
pub struct ServerManager {
    config: ListenerConfig,
    state: watch::Sender<ListenerState>,
    running: Mutex<Option<RunningServer>>,
}

impl ServerManager {
    pub fn new(config: ListenerConfig) -> Self {
        let (state, _) = watch::channel(ListenerState::Stopped);
        Self {
            config,
            state,
            running: Mutex::new(None),
        }
    }

    fn set_state(&self, next: ListenerState) {
        self.state.send_replace(next);
        metrics::record_listener_state(next == ListenerState::Running);
    }

    /// Bind and start serving `router`.
    ///
    /// Starting an already running server is a no-op that returns the
    /// bound address. On bind failure the state returns to `Stopped`.
    pub async fn start(&self, router: Router) -> Result<SocketAddr, ListenError> {
        let mut running = self.running.lock().await;
        if let Some(server) = running.as_ref() {
            tracing::debug!(address = %server.addr, "HTTP server already running");
            return Ok(server.addr);
        }

        self.set_state(ListenerState::Starting);

        let listener = match net::bind(&self.config).await {
            Ok(listener) => listener,
            Err(err) => {
                self.set_state(ListenerState::Stopped);
                tracing::error!(error = %err, "HTTP server failed to start");
                return Err(err);
            }
        };
        let addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(source) => {
                self.set_state(ListenerState::Stopped);
                return Err(ListenError::Bind {
                    address: self.config.bind_address(),
                    source,
                });
            }
        };

        let shutdown = Shutdown::new();
        let signal = shutdown.signal();
        let app = router.into_make_service_with_connect_info::<SocketAddr>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(signal)
                .await
        });

        *running = Some(RunningServer {
            addr,
            shutdown,
            task,
        });
        self.set_state(ListenerState::Running);
        tracing::info!(address = %addr, "HTTP server listening");

        Ok(addr)
    }

    /// Stop accepting, drain in-flight requests and release the port.
    /// A no-op when not running.
    pub async fn stop(&self) {
        let mut running = self.running.lock().await;
        let Some(server) = running.take() else {
            tracing::debug!("HTTP server already stopped");
            return;
        };

        self.set_state(ListenerState::Stopping);
        tracing::info!(address = %server.addr, "HTTP server stopping");
        server.shutdown.trigger();

        let deadline = Duration::from_millis(self.config.shutdown_timeout_ms);
        let mut task = server.task;
        match time::timeout(deadline, &mut task).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(err))) => tracing::warn!(error = %err, "HTTP server exited with error"),
            Ok(Err(err)) => tracing::warn!(error = %err, "HTTP server task failed"),
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.shutdown_timeout_ms,
                    "Drain deadline passed, abandoning in-flight connections"
                );
                task.abort();
                let _ = task.await;
            }
        }

        self.set_state(ListenerState::Stopped);
        tracing::info!("HTTP server stopped");
    }

    pub fn is_running(&self) -> bool {
        self.state() == ListenerState::Running
    }

    pub fn state(&self) -> ListenerState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ListenerState> {
        self.state.subscribe()
    }

    /// Bound address while running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|server| server.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use std::sync::Arc;

    fn manager() -> ServerManager {
        ServerManager::new(ListenerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..ListenerConfig::default()
        })
    }

    fn router() -> Router {
        Router::new().route("/", get(|| async { "ok" }))
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let server = manager();
        assert_eq!(server.state(), ListenerState::Stopped);

        let addr = server.start(router()).await.unwrap();
        assert!(server.is_running());
        assert_eq!(server.local_addr().await, Some(addr));

        server.stop().await;
        assert_eq!(server.state(), ListenerState::Stopped);
        assert!(tokio::net::TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn test_start_while_running_returns_same_address() {
        let server = manager();
        let first = server.start(router()).await.unwrap();
        let second = server.start(router()).await.unwrap();

        assert_eq!(first, second);
        server.stop().await;
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let server = manager();
        server.stop().await;
        assert_eq!(server.state(), ListenerState::Stopped);
    }

    #[tokio::test]
    async fn test_concurrent_stops() {
        let server = Arc::new(manager());
        server.start(router()).await.unwrap();

        tokio::join!(server.stop(), server.stop());
        assert!(!server.is_running());
    }

    #[tokio::test]
    async fn test_bind_failure_returns_to_stopped() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();
        let server = ServerManager::new(ListenerConfig {
            host: "127.0.0.1".to_string(),
            port,
            ..ListenerConfig::default()
        });
        let mut states = server.subscribe_state();

        let err = server.start(router()).await.unwrap_err();

        assert!(matches!(err, ListenError::Bind { .. }));
        assert_eq!(server.state(), ListenerState::Stopped);
        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), ListenerState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_gives_up_on_stuck_request_after_deadline() {
        let (entered_tx, mut entered) = tokio::sync::mpsc::unbounded_channel();
        let router = Router::new().route(
            "/hang",
            get(move || {
                let entered_tx = entered_tx.clone();
                async move {
                    let _ = entered_tx.send(());
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    "late"
                }
            }),
        );
        let server = ServerManager::new(ListenerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            shutdown_timeout_ms: 100,
        });
        let addr = server.start(router).await.unwrap();

        let request = tokio::spawn(reqwest::get(format!("http://{addr}/hang")));
        entered.recv().await.unwrap();

        tokio::time::timeout(Duration::from_secs(2), server.stop())
            .await
            .expect("stop waited past the drain deadline");
        assert_eq!(server.state(), ListenerState::Stopped);
        assert!(tokio::net::TcpStream::connect(addr).await.is_err());
        request.abort();
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let server = manager();
        server.start(router()).await.unwrap();
        server.stop().await;

        server.start(router()).await.unwrap();
        assert!(server.is_running());
        server.stop().await;
    }
}
