use aerobook_core::{CoreError, FieldError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String, Vec<FieldError>),
    NotFoundError(String),
    ConflictError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl AppError {
    /// HTTP class of a domain error.
    pub fn from_core(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(what) => AppError::NotFoundError(format!("{} not found", what)),
            CoreError::ValidationError(fields) => {
                let msg = CoreError::ValidationError(fields.clone()).to_string();
                AppError::ValidationError(msg, fields)
            }
            CoreError::ConflictError(msg) => AppError::ConflictError(msg),
            CoreError::StateError(msg) => AppError::ConflictError(msg),
            CoreError::AuthorizationError(msg) => AppError::AuthorizationError(msg),
            CoreError::IntegrityError(msg) => {
                AppError::InternalServerError(format!("integrity violation: {}", msg))
            }
            CoreError::StorageError(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg, None),
            AppError::ValidationError(msg, fields) => (StatusCode::UNPROCESSABLE_ENTITY, msg, Some(fields)),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg, None),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string(), None)
            }
            AppError::Anyhow(err) => match err.downcast::<CoreError>() {
                // Handlers bubble CoreError through `?`; classify it here.
                Ok(core) => return AppError::from_core(core).into_response(),
                Err(err) => {
                    tracing::error!("Internal Server Error: {:#}", err);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string(), None)
                }
            },
        };

        let body = match details {
            Some(fields) => json!({ "error": error_message, "details": fields }),
            None => json!({ "error": error_message }),
        };

        (status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}
