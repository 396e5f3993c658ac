use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

/// Domain error taxonomy for the whole API surface.
///
/// Store-layer failures are collapsed into `Internal`; their detail is
/// logged but never sent to the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Email already exists")]
    DuplicateEmail,
    #[error("Invalid Email or Password")]
    Auth,
    #[error("Already booked on {date} from {start} to {end}")]
    Conflict {
        date: String,
        start: String,
        end: String,
    },
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(_) | ApiError::DuplicateEmail => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::Auth => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Conflict { .. } => (StatusCode::CONFLICT, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (
            status,
            Json(ErrorBody {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}

/// Wrap any store/infrastructure error as a 500 without leaking detail.
pub fn internal<E: Into<anyhow::Error>>(e: E) -> ApiError {
    ApiError::Internal(e.into())
}
