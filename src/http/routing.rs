//! Default route table.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use axum::routing::get;

use crate::bootstrap::RoutingSetup;
use crate::events::EventBus;
use crate::http::health::{health_check, HealthState};
use crate::http::surface::RequestSurface;
use crate::modules::users::{self, UserService};
use crate::registry::BoxError;
use crate::security::RateLimiter;

/// Mounts `GET /health` and the `/auth` routes.
pub struct RoutingManager {
    users: Arc<UserService>,
    limiter: Arc<RateLimiter>,
    health: HealthState,
}

impl RoutingManager {
    pub fn new(
        users: Arc<UserService>,
        limiter: Arc<RateLimiter>,
        events: Arc<EventBus>,
        started_at: Instant,
    ) -> Self {
        Self {
            users,
            limiter,
            health: HealthState { started_at, events },
        }
    }
}

#[async_trait]
impl RoutingSetup for RoutingManager {
    async fn setup_routing(&self, surface: &mut RequestSurface) -> Result<(), BoxError> {
        let health = self.health.clone();
        surface.add_routes("health", move |router| {
            router.route("/health", get(health_check).with_state(health))
        });

        let auth = users::routes(Arc::clone(&self.users), Arc::clone(&self.limiter));
        surface.add_routes("auth", move |router| router.nest("/auth", auth));

        Ok(())
    }
}
