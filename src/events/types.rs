//! Event types and their payloads.

use std::fmt;

use serde::Serialize;

use crate::modules::users::User;

/// Every event the application can publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    SendWelcomeMail,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::SendWelcomeMail => "SEND_WELCOME_MAIL",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payload bound to exactly one [`EventType`].
pub trait Event: Clone + Send + Sync + 'static {
    const TYPE: EventType;
}

/// Published after a user registers; asks for a welcome email.
#[derive(Debug, Clone, Serialize)]
pub struct WelcomeMail {
    pub user: User,
}

impl Event for WelcomeMail {
    const TYPE: EventType = EventType::SendWelcomeMail;
}
