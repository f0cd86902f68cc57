use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use thiserror::Error;

use crate::repository::errors::RepositoryError;

#[derive(Debug, Error)]
pub enum UsecaseError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl UsecaseError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UsecaseError::NotFound(_) => StatusCode::NOT_FOUND,
            UsecaseError::Validation(_) => StatusCode::BAD_REQUEST,
            UsecaseError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            UsecaseError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for UsecaseError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => UsecaseError::NotFound("Comment".to_string()),
            RepositoryError::ConnectionUnavailable => {
                UsecaseError::Unavailable("The database is not connected.".to_string())
            }
            RepositoryError::DatabaseError(msg) => UsecaseError::Internal(msg),
        }
    }
}

impl IntoResponse for UsecaseError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        let message = match &self {
            UsecaseError::Internal(_) => {
                tracing::error!(error = %self, "internal error");
                "Internal server error".to_string()
            }
            UsecaseError::NotFound(_) => {
                tracing::warn!(error = %self, "resource not found");
                self.to_string()
            }
            UsecaseError::Unavailable(_) => {
                tracing::warn!(error = %self, "store unavailable");
                self.to_string()
            }
            UsecaseError::Validation(_) => {
                tracing::debug!(error = %self);
                self.to_string()
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
