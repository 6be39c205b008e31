//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .env (dotenvy, binary only)
//!     → config file (TOML, optional)
//!     → loader.rs (parse & deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → cloned into the factories that need it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AppConfig, CorsConfig, EmailConfig, Environment, HttpConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, RateLimitConfig,
};
pub use validation::ValidationError;
