//! Capabilities resolved by the bootstrap phases.

use async_trait::async_trait;

use crate::http::surface::RequestSurface;
use crate::registry::{BoxError, Token};

/// Installs the request pipeline (parsing, CORS, headers, access log).
#[async_trait]
pub trait PipelineSetup: Send + Sync {
    async fn setup_pipeline(&self, surface: &mut RequestSurface) -> Result<(), BoxError>;
}

/// Mounts the application's routes.
#[async_trait]
pub trait RoutingSetup: Send + Sync {
    async fn setup_routing(&self, surface: &mut RequestSurface) -> Result<(), BoxError>;
}

/// Installs the final error handlers.
#[async_trait]
pub trait ErrorHandlingSetup: Send + Sync {
    async fn setup_error_handling(&self, surface: &mut RequestSurface) -> Result<(), BoxError>;
}

pub const MIDDLEWARE_MANAGER: Token<dyn PipelineSetup> = Token::new("MiddlewareManager");
pub const ROUTING_MANAGER: Token<dyn RoutingSetup> = Token::new("RoutingManager");
pub const ERROR_HANDLING_MANAGER: Token<dyn ErrorHandlingSetup> =
    Token::new("ErrorHandlingManager");
