//! Validated JSON body extractor.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::error::AppError;

/// Like [`Json`], but rejects with the JSON error shape and runs
/// [`Validate`] before the handler sees the value.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(reject_json)?;

        value
            .validate()
            .map_err(|errors| AppError::bad_request(first_violation(&errors)))?;

        Ok(Self(value))
    }
}

fn reject_json(rejection: JsonRejection) -> AppError {
    match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::from_status(StatusCode::PAYLOAD_TOO_LARGE),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => AppError::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "UNSUPPORTED_MEDIA_TYPE",
            "Expected request with `Content-Type: application/json`",
        ),
        _ => AppError::bad_request("Invalid JSON"),
    }
}

/// `field: message` for the first violation, fields in name order.
pub fn first_violation(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .find_map(|(field, violations)| {
            violations.first().map(|violation| {
                let message = violation.message.as_deref().unwrap_or(&violation.code);
                format!("{field}: {message}")
            })
        })
        .unwrap_or_else(|| "Invalid data".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::users::CreateUser;

    #[test]
    fn test_first_violation_format() {
        let payload = CreateUser {
            firstname: "Ada".into(),
            lastname: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: "short".into(),
            phone: None,
        };
        let errors = payload.validate().unwrap_err();

        assert_eq!(
            first_violation(&errors),
            "password: Password must be at least 8 characters"
        );
    }
}
