//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (app.rs):
//!     Load config → Bootstrap phases → Start listener
//!
//! Shutdown (shutdown.rs):
//!     stop() → Trigger → Stop accepting → Drain connections → Stopped
//!     (drain abandoned after listener.shutdown_timeout_ms)
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → App::stop → exit 0
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then bootstrap, then listener
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has a deadline; the drain is abandoned once it passes
//! - Only the first termination signal acts; later ones are swallowed

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_termination;
