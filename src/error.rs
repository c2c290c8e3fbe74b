use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::envelope::Envelope;
use crate::validation::ValidationErrors;

/// Failures raised by a [`ContactRepository`](crate::repo::ContactRepository).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Every way a contact operation can fail, as seen by the HTTP layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", .0.summary())]
    Validation(ValidationErrors),

    #[error("Contact with this email already exists")]
    EmailTaken { email: String },

    #[error("Contact not found")]
    NotFound { id: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::EmailTaken { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        ApiError::NotFound { id: id.into() }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(ValidationErrors::single("body", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(ValidationErrors::single("query", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            ApiError::Validation(errors) => Envelope::error(errors.summary(), Some(errors)),
            ApiError::Store(err) => {
                tracing::error!(error = %err, "contact store failure");
                Envelope::error("Internal server error", None)
            }
            other => Envelope::error(other.to_string(), None),
        };
        (status, Json(body)).into_response()
    }
}
