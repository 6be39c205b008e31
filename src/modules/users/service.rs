//! Registration use case.

use std::sync::Arc;

use super::entity::{CreateUser, User};
use super::repository::{UserError, UserRepository};
use crate::events::{EventBus, WelcomeMail};

pub struct UserService {
    repository: Arc<dyn UserRepository>,
    events: Arc<EventBus>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>, events: Arc<EventBus>) -> Self {
        Self { repository, events }
    }

    /// Store the user, then announce the registration.
    ///
    /// Subscribers of the welcome mail run on their own tasks; their
    /// outcome never affects the registration result.
    pub async fn register_new_user(&self, data: CreateUser) -> Result<User, UserError> {
        let user = self.repository.create(data).await?;
        tracing::info!(user_id = %user.id, "User registered");

        self.events.publish(WelcomeMail { user: user.clone() });
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventType;
    use crate::modules::users::InMemoryUserRepository;
    use crate::registry::BoxError;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn payload() -> CreateUser {
        CreateUser {
            firstname: "Alan".into(),
            lastname: "Turing".into(),
            email: "alan@example.com".into(),
            password: "enigma-machine".into(),
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_register_publishes_welcome_mail() {
        let events = Arc::new(EventBus::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        events.subscribe(
            move |mail: WelcomeMail| {
                let tx = tx.clone();
                async move { tx.send(mail.user.email).map_err(BoxError::from) }
            },
            "recorder",
        );
        assert_eq!(events.subscriber_count(EventType::SendWelcomeMail), 1);

        let service = UserService::new(Arc::new(InMemoryUserRepository::new()), events);
        let user = service.register_new_user(payload()).await.unwrap();

        let delivered = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(delivered, user.email);
    }

    #[tokio::test]
    async fn test_duplicate_registration_publishes_nothing() {
        let events = Arc::new(EventBus::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        events.subscribe(
            move |mail: WelcomeMail| {
                let tx = tx.clone();
                async move { tx.send(mail.user.email).map_err(BoxError::from) }
            },
            "counter",
        );
        let service = UserService::new(Arc::new(InMemoryUserRepository::new()), Arc::clone(&events));

        service.register_new_user(payload()).await.unwrap();
        let err = service.register_new_user(payload()).await.unwrap_err();
        assert!(matches!(err, UserError::EmailTaken(_)));

        let first = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap();
        assert_eq!(first.as_deref(), Some("alan@example.com"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(events.diagnostics().delivered(), 1);
    }
}
