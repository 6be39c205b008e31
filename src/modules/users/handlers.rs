//! HTTP handlers for the auth routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::entity::{CreateUser, User};
use super::repository::UserError;
use super::service::UserService;
use crate::http::error::AppError;
use crate::http::extract::ValidatedJson;
use crate::http::response::ApiResponse;

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::EmailTaken(_) => AppError::conflict(err.to_string()),
        }
    }
}

/// `POST /auth/register`
pub async fn register(
    State(users): State<Arc<UserService>>,
    ValidatedJson(body): ValidatedJson<CreateUser>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), AppError> {
    let user = users.register_new_user(body).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("User registered successfully", user)),
    ))
}
