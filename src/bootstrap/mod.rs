//! Bootstrap orchestration subsystem.
//!
//! # Data Flow
//! ```text
//! App::start / App::router
//!     → orchestrator.rs Bootstrapper::bootstrap(&mut RequestSurface)
//!         1. RegisterServices      → Registrar fills the Registry
//!         2. SetupRequestPipeline  → resolve MiddlewareManager    → add_layer(...)
//!         3. SetupRouting          → resolve RoutingManager       → add_routes(...)
//!         4. SetupErrorHandling    → resolve ErrorHandlingManager → add_error_handler(...)
//!     → RequestSurface::into_router()
//! ```
//!
//! # Design Decisions
//! - Phases are strictly sequential; the first failure aborts the rest and
//!   is reported with its original cause
//! - Nothing already installed is rolled back on failure
//! - A bootstrapper runs once; a second call is an error, not a re-run
//! - Each phase talks to the registry through a capability token, so
//!   alternate managers are a registration away

pub mod capabilities;
pub mod orchestrator;
pub mod registrar;

pub use capabilities::{
    ErrorHandlingSetup, PipelineSetup, RoutingSetup, ERROR_HANDLING_MANAGER, MIDDLEWARE_MANAGER,
    ROUTING_MANAGER,
};
pub use orchestrator::{BootstrapError, BootstrapState, Bootstrapper, Phase};
pub use registrar::{Registrar, ServiceRegistrar};
