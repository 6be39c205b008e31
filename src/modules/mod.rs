//! Domain modules.
//!
//! # Data Flow
//! ```text
//! POST /auth/register
//!     → users::handlers (validated JSON)
//!     → users::UserService → UserRepository
//!     → EventBus::publish(WelcomeMail)
//!     → emails::EmailService (subscribed as "EmailService")
//! ```
//!
//! # Design Decisions
//! - Modules never reach for globals; collaborators arrive through the
//!   registry factories that build them
//! - Modules talk to each other only through events

pub mod emails;
pub mod users;
