//! User registration.

pub mod entity;
pub mod handlers;
pub mod repository;
pub mod service;

use std::sync::Arc;

use axum::routing::post;
use axum::{middleware, Router};

use crate::registry::Token;
use crate::security::rate_limit::{rate_limit_middleware, RateLimiter};

pub use entity::{CreateUser, User};
pub use repository::{InMemoryUserRepository, UserError, UserRepository};
pub use service::UserService;

pub const USER_REPOSITORY: Token<dyn UserRepository> = Token::new("UserRepository");
pub const USER_SERVICE: Token<UserService> = Token::new("UserService");

/// Routes mounted under `/auth`; registration is rate limited.
pub fn routes(users: Arc<UserService>, limiter: Arc<RateLimiter>) -> Router {
    Router::new()
        .route("/register", post(handlers::register))
        .route_layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
        .with_state(users)
}
