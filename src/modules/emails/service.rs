//! Welcome mail delivery.
//!
//! # Responsibilities
//! - Subscribe to `SEND_WELCOME_MAIL`
//! - Simulate handing the message to a mail provider
//!
//! # Design Decisions
//! - No provider integration; sending is a logged delay
//! - Errors surface to the event bus, which records and contains them

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::SUBSCRIBER_NAME;
use crate::config::EmailConfig;
use crate::events::{EventBus, WelcomeMail};
use crate::registry::BoxError;

#[derive(Debug)]
pub struct EmailService {
    send_delay: Duration,
    sent: AtomicU64,
}

impl EmailService {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            send_delay: Duration::from_millis(config.send_delay_ms),
            sent: AtomicU64::new(0),
        }
    }

    /// Attach this service to the bus as the welcome-mail subscriber.
    pub fn subscribe(self: &Arc<Self>, events: &EventBus) {
        let service = Arc::clone(self);
        events.subscribe(
            move |mail: WelcomeMail| {
                let service = Arc::clone(&service);
                async move { service.send_register_mail(&mail).await }
            },
            SUBSCRIBER_NAME,
        );
    }

    pub async fn send_register_mail(&self, mail: &WelcomeMail) -> Result<(), BoxError> {
        let recipient = &mail.user.email;
        tracing::info!(recipient = %recipient, "Sending welcome email");

        tokio::time::sleep(self.send_delay).await;

        self.sent.fetch_add(1, Ordering::Relaxed);
        tracing::info!(recipient = %recipient, "Welcome email sent");
        Ok(())
    }

    /// Mails handed off since startup.
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}
