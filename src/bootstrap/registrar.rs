//! Service registration, the first bootstrap phase.
//!
//! # Responsibilities
//! - Register infrastructure managers under their capability tokens
//! - Register domain services and wire their dependencies
//! - Start services that must exist before the first request
//!
//! # Design Decisions
//! - Factories that need other entries hold a `Weak<Registry>`, never an
//!   `Arc`, so the registry does not own itself
//! - Everything is a singleton; construction stays lazy except for the mail
//!   service, which must subscribe before users can register

use std::sync::{Arc, Weak};
use std::time::Instant;

use async_trait::async_trait;

use super::capabilities::{
    ErrorHandlingSetup, PipelineSetup, RoutingSetup, ERROR_HANDLING_MANAGER, MIDDLEWARE_MANAGER,
    ROUTING_MANAGER,
};
use crate::config::AppConfig;
use crate::events::EventBus;
use crate::http::errors::ErrorHandlingManager;
use crate::http::pipeline::MiddlewareManager;
use crate::http::routing::RoutingManager;
use crate::modules::emails::{EmailService, EMAIL_SERVICE};
use crate::modules::users::{
    InMemoryUserRepository, UserRepository, UserService, USER_REPOSITORY, USER_SERVICE,
};
use crate::registry::{BoxError, Registry};
use crate::security::rate_limit::{RateLimiter, RATE_LIMITER};

/// Fills a registry during [`Phase::RegisterServices`](super::Phase).
#[async_trait]
pub trait Registrar: Send + Sync {
    async fn register_services(&self, registry: &Arc<Registry>) -> Result<(), BoxError>;
}

fn upgrade(registry: &Weak<Registry>) -> Result<Arc<Registry>, BoxError> {
    registry
        .upgrade()
        .ok_or_else(|| BoxError::from("registry dropped before resolution"))
}

/// Default registrations for the service.
pub struct ServiceRegistrar {
    config: Arc<AppConfig>,
    events: Arc<EventBus>,
    started_at: Instant,
}

impl ServiceRegistrar {
    pub fn new(config: AppConfig, events: Arc<EventBus>) -> Self {
        Self {
            config: Arc::new(config),
            events,
            started_at: Instant::now(),
        }
    }

    fn register_infrastructure(&self, registry: &Arc<Registry>) -> Result<(), BoxError> {
        let config = Arc::clone(&self.config);
        registry.register_singleton(&MIDDLEWARE_MANAGER, move || {
            let manager = MiddlewareManager::new(&config);
            async move { Ok::<_, BoxError>(Arc::new(manager) as Arc<dyn PipelineSetup>) }
        })?;

        let config = Arc::clone(&self.config);
        registry.register_singleton(&RATE_LIMITER, move || {
            let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
            async move {
                limiter.spawn_sweeper();
                Ok::<_, BoxError>(limiter)
            }
        })?;

        let weak = Arc::downgrade(registry);
        let events = Arc::clone(&self.events);
        let started_at = self.started_at;
        registry.register_singleton(&ROUTING_MANAGER, move || {
            let weak = weak.clone();
            let events = Arc::clone(&events);
            async move {
                let registry = upgrade(&weak)?;
                let users = registry.resolve(&USER_SERVICE).await?;
                let limiter = registry.resolve(&RATE_LIMITER).await?;
                let manager = RoutingManager::new(users, limiter, events, started_at);
                Ok::<_, BoxError>(Arc::new(manager) as Arc<dyn RoutingSetup>)
            }
        })?;

        let environment = self.config.environment;
        registry.register_singleton(&ERROR_HANDLING_MANAGER, move || async move {
            Ok::<_, BoxError>(
                Arc::new(ErrorHandlingManager::new(environment)) as Arc<dyn ErrorHandlingSetup>
            )
        })?;

        Ok(())
    }

    fn register_domain(&self, registry: &Arc<Registry>) -> Result<(), BoxError> {
        registry.register_singleton(&USER_REPOSITORY, || async {
            Ok::<_, BoxError>(Arc::new(InMemoryUserRepository::new()) as Arc<dyn UserRepository>)
        })?;

        let weak = Arc::downgrade(registry);
        let events = Arc::clone(&self.events);
        registry.register_singleton(&USER_SERVICE, move || {
            let weak = weak.clone();
            let events = Arc::clone(&events);
            async move {
                let repository = upgrade(&weak)?.resolve(&USER_REPOSITORY).await?;
                Ok::<_, BoxError>(Arc::new(UserService::new(repository, events)))
            }
        })?;

        let config = Arc::clone(&self.config);
        let events = Arc::clone(&self.events);
        registry.register_singleton(&EMAIL_SERVICE, move || {
            let service = Arc::new(EmailService::new(&config.email));
            service.subscribe(&events);
            async move { Ok::<_, BoxError>(service) }
        })?;

        Ok(())
    }
}

#[async_trait]
impl Registrar for ServiceRegistrar {
    async fn register_services(&self, registry: &Arc<Registry>) -> Result<(), BoxError> {
        self.register_infrastructure(registry)?;
        self.register_domain(registry)?;

        registry.resolve(&EMAIL_SERVICE).await?;

        tracing::info!(services = ?registry.names(), "Services registered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventType;

    #[tokio::test]
    async fn test_registers_every_capability() {
        let events = Arc::new(EventBus::new());
        let registry = Arc::new(Registry::new());
        let registrar = ServiceRegistrar::new(AppConfig::default(), Arc::clone(&events));

        registrar.register_services(&registry).await.unwrap();

        for name in [
            "MiddlewareManager",
            "RoutingManager",
            "ErrorHandlingManager",
            "RateLimiter",
            "UserRepository",
            "UserService",
            "EmailService",
        ] {
            assert!(registry.has(name), "{name} not registered");
        }
        assert_eq!(events.subscriber_count(EventType::SendWelcomeMail), 1);
    }

    #[tokio::test]
    async fn test_routing_manager_resolves_its_dependencies() {
        let registry = Arc::new(Registry::new());
        ServiceRegistrar::new(AppConfig::default(), Arc::new(EventBus::new()))
            .register_services(&registry)
            .await
            .unwrap();

        registry.resolve(&ROUTING_MANAGER).await.unwrap();
        let first = registry.resolve(&USER_SERVICE).await.unwrap();
        let second = registry.resolve(&USER_SERVICE).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_registering_twice_fails() {
        let registry = Arc::new(Registry::new());
        let registrar = ServiceRegistrar::new(AppConfig::default(), Arc::new(EventBus::new()));

        registrar.register_services(&registry).await.unwrap();
        assert!(registrar.register_services(&registry).await.is_err());
    }
}
