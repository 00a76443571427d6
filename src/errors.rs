use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::customers::DirectoryError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("bookings backend error: {0}")]
    Upstream(String),

    #[error("an operation is already in flight for booking {0}")]
    OperationInFlight(i64),

    #[error("confirmation is required before hiding a customer from history")]
    ConfirmationRequired,

    #[error("unauthorized")]
    Unauthorized,
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::AlreadyInFlight(id) => AppError::OperationInFlight(id),
            DirectoryError::Backend(e) => AppError::Upstream(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::OperationInFlight(_) => StatusCode::CONFLICT,
            AppError::ConfirmationRequired => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
