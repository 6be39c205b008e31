//! Composition root.
//!
//! # Responsibilities
//! - Own the registry, bootstrapper, listener and event bus for one process
//! - Bootstrap once and serve the resulting router
//! - Stop the listener on request
//!
//! # Design Decisions
//! - No globals: everything reachable from a request hangs off an [`App`]
//! - The router is built once; later calls reuse it

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::bootstrap::{BootstrapError, Bootstrapper, Registrar, ServiceRegistrar};
use crate::config::AppConfig;
use crate::events::EventBus;
use crate::http::{ListenerState, RequestSurface, ServerManager};
use crate::net::ListenError;
use crate::registry::Registry;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error(transparent)]
    Listen(#[from] ListenError),
}

pub struct App {
    config: AppConfig,
    registry: Arc<Registry>,
    bootstrapper: Bootstrapper,
    server: ServerManager,
    events: Arc<EventBus>,
    router: OnceCell<Router>,
}

impl App {
    /// Compose the service with its default registrations.
    pub fn new(config: AppConfig) -> Self {
        let events = Arc::new(EventBus::new());
        let registrar = Arc::new(ServiceRegistrar::new(config.clone(), Arc::clone(&events)));
        Self::with_registrar(config, events, registrar)
    }

    /// Compose with alternate registrations.
    pub fn with_registrar(
        config: AppConfig,
        events: Arc<EventBus>,
        registrar: Arc<dyn Registrar>,
    ) -> Self {
        let registry = Arc::new(Registry::new());
        Self {
            bootstrapper: Bootstrapper::new(Arc::clone(&registry), registrar),
            server: ServerManager::new(config.listener.clone()),
            config,
            registry,
            events,
            router: OnceCell::new(),
        }
    }

    /// Bootstrap on first call and return the finished router.
    pub async fn router(&self) -> Result<Router, BootstrapError> {
        self.router
            .get_or_try_init(|| async {
                let mut surface = RequestSurface::new();
                self.bootstrapper.bootstrap(&mut surface).await?;
                Ok::<_, BootstrapError>(surface.into_router())
            })
            .await
            .cloned()
    }

    /// Bootstrap (once) and start listening.
    pub async fn start(&self) -> Result<SocketAddr, StartupError> {
        tracing::info!(environment = %self.config.environment, "Starting application");
        let router = self.router().await?;
        Ok(self.server.start(router).await?)
    }

    /// Close the listener. Safe to call at any time, any number of times.
    pub async fn stop(&self) {
        self.server.stop().await;
    }

    pub fn is_running(&self) -> bool {
        self.server.is_running()
    }

    pub fn state(&self) -> ListenerState {
        self.server.state()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn server(&self) -> &ServerManager {
        &self.server
    }
}
