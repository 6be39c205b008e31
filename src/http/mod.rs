//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Bootstrap phases
//!     → surface.rs (record route / pipeline / error stages)
//!     → pipeline.rs, routing.rs, errors.rs (default managers)
//!     → RequestSurface::into_router()
//!     → server.rs ServerManager (bind, serve, graceful stop)
//!
//! Per request:
//!     body limit → timeout → cookies → CORS → security headers → access log
//!     → handler (extract.rs, error.rs, response.rs)
//!     → panic catcher / error normaliser on the way out
//! ```

pub mod error;
pub mod errors;
pub mod extract;
pub mod health;
pub mod pipeline;
pub mod response;
pub mod routing;
pub mod server;
pub mod surface;

pub use error::AppError;
pub use response::ApiResponse;
pub use server::{ListenerState, ServerManager};
pub use surface::RequestSurface;
