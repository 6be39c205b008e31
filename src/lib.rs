//! HTTP service scaffold.
//!
//! A composition-and-lifecycle core (typed service registry, four-phase
//! bootstrap, managed listener, in-process event bus) with a small user
//! registration module wired through it.

// Core
pub mod app;
pub mod bootstrap;
pub mod events;
pub mod registry;

// HTTP surface
pub mod http;
pub mod net;
pub mod security;

// Domain
pub mod modules;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use app::{App, StartupError};
pub use config::AppConfig;
pub use events::EventBus;
pub use registry::{Registry, Token};
