//! Service registry subsystem.
//!
//! # Data Flow
//! ```text
//! Registrar (bootstrap phase 1)
//!     → register / register_singleton (token + async factory)
//!     → container.rs stores Registration { lifetime, capability type }
//!
//! Consumer
//!     → resolve(token)
//!     → transient: run factory, return fresh Arc<T>
//!     → singleton: Uninitialized → Initializing(shared future) → Ready(Arc<T>)
//! ```
//!
//! # Design Decisions
//! - Tokens carry the capability type, so resolution is checked twice:
//!   statically through `Token<T>`, at runtime through the stored `TypeId`
//! - A name can be registered once; duplicates fail fast
//! - Concurrent resolvers of a cold singleton share one in-flight construction

pub mod container;
pub mod token;

pub use container::{BoxError, Lifetime, Registry, RegistryError, SharedError};
pub use token::Token;
