//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cookies.rs (parse Cookie header into a CookieJar)
//!     → cors.rs (allowlisted origins per environment)
//!     → headers.rs (hardening response headers)
//!     → rate_limit.rs (per method/URI/IP window on guarded routes)
//!     → Pass to handler
//! ```
//!
//! # Design Decisions
//! - Defense in depth: multiple layers of protection
//! - No trust in client input

pub mod cookies;
pub mod cors;
pub mod headers;
pub mod rate_limit;

pub use rate_limit::{RateLimiter, RATE_LIMITER};
