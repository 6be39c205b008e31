//! In-process event bus.
//!
//! # Data Flow
//! ```text
//! Publisher (e.g. UserService)
//!     → publish(WelcomeMail { user })
//!     → bus.rs snapshots the subscriber list for SEND_WELCOME_MAIL
//!     → each handler is invoked in subscription order, then runs on its
//!       own task, isolated
//!     → diagnostics.rs records Delivered / Failed per subscriber
//! ```
//!
//! # Design Decisions
//! - The set of events is closed: every payload type implements [`Event`]
//!   and names its [`EventType`]
//! - A failing, panicking or stuck handler never reaches the publisher or
//!   the handlers after it
//! - Subscribing during an in-flight publish only affects later publishes

pub mod bus;
pub mod diagnostics;
pub mod types;

pub use bus::{Delivery, EventBus, HandlerError};
pub use diagnostics::{DeliveryOutcome, DeliveryStats};
pub use types::{Event, EventType, WelcomeMail};
