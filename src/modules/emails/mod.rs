//! Outgoing mail.

pub mod service;

use crate::registry::Token;

pub use service::EmailService;

pub const EMAIL_SERVICE: Token<EmailService> = Token::new("EmailService");

/// Name the mail service subscribes under.
pub const SUBSCRIBER_NAME: &str = "EmailService";
