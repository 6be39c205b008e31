//! User storage.
//!
//! # Responsibilities
//! - Persist new users
//! - Enforce one account per email address
//!
//! # Design Decisions
//! - Storage sits behind [`UserRepository`] so the service never knows the
//!   backend
//! - Emails compare case-insensitively

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;

use super::entity::{CreateUser, User};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Email {0} is already registered")]
    EmailTaken(String),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, data: CreateUser) -> Result<User, UserError>;

    async fn find_by_email(&self, email: &str) -> Option<User>;
}

/// Process-local repository keyed by normalised email.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: DashMap<String, User>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

fn normalise(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, data: CreateUser) -> Result<User, UserError> {
        match self.users.entry(normalise(&data.email)) {
            Entry::Occupied(_) => Err(UserError::EmailTaken(data.email)),
            Entry::Vacant(slot) => {
                let user = User::from_registration(data);
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Option<User> {
        self.users.get(&normalise(email)).map(|user| user.clone())
    }
}
