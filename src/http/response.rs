//! Success envelope.

use serde::Serialize;

/// `{"status": true, "message": ..., "data": ...}`
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}
