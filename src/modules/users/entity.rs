//! User records and the registration payload.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A registered user.
///
/// The password is kept for the repository but never serialised.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a new user from a registration payload, stamping id and times.
    pub fn from_registration(data: CreateUser) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            firstname: data.firstname,
            lastname: data.lastname,
            email: data.email,
            password: data.password,
            phone: data.phone,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Body of `POST /auth/register`.
#[derive(Clone, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(length(min = 1, message = "First name is required"))]
    pub firstname: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    pub lastname: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 7, max = 20, message = "Phone must be between 7 and 20 characters"))]
    #[serde(default)]
    pub phone: Option<String>,
}

impl fmt::Debug for CreateUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateUser")
            .field("firstname", &self.firstname)
            .field("lastname", &self.lastname)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("phone", &self.phone)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> CreateUser {
        CreateUser {
            firstname: "Ada".into(),
            lastname: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: "correct-horse".into(),
            phone: Some("+441234567".into()),
        }
    }

    #[test]
    fn test_password_is_never_serialised() {
        let user = User::from_registration(payload());
        let json = serde_json::to_value(&user).unwrap();

        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "ada@example.com");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", payload());
        assert!(!rendered.contains("correct-horse"));
    }

    #[test]
    fn test_validation_rules() {
        assert!(payload().validate().is_ok());

        let mut short = payload();
        short.password = "short".into();
        let errors = short.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));

        let mut bad_email = payload();
        bad_email.email = "not-an-email".into();
        assert!(bad_email.validate().is_err());

        let mut no_phone = payload();
        no_phone.phone = None;
        assert!(no_phone.validate().is_ok());

        let mut tiny_phone = payload();
        tiny_phone.phone = Some("123".into());
        assert!(tiny_phone.validate().is_err());
    }
}
