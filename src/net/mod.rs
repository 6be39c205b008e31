//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig { host, port }
//!     → listener.rs (resolve host, bind TCP socket)
//!     → Hand off to http::server::ServerManager
//! ```
//!
//! # Design Decisions
//! - Resolution and bind failures are distinct errors
//! - Port 0 binds an ephemeral port; callers read the real address back

pub mod listener;

pub use listener::{bind, ListenError};
