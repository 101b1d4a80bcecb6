use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    definitions::{ErrorCode, ErrorResponse},
    scenario,
};

/// Everything a handler can fail with, and how each failure looks on the wire.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No client certificate in request")]
    Unauthorized,
    #[error("No such order")]
    NoSuchOrder,
    #[error("{0}")]
    InvalidParameters(String),
    #[error(transparent)]
    Scenario(#[from] scenario::Error),
    #[error("order store lock poisoned")]
    Poisoned,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidParameters(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NoSuchOrder | ApiError::InvalidParameters(_) => StatusCode::BAD_REQUEST,
            ApiError::Scenario(_) | ApiError::Poisoned => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Unauthorized => (status, self.to_string()).into_response(),
            ApiError::NoSuchOrder | ApiError::InvalidParameters(_) => (
                status,
                Json(ErrorResponse::new(ErrorCode::InvalidParameters, self.to_string())),
            )
                .into_response(),
            ApiError::Scenario(_) | ApiError::Poisoned => {
                tracing::error!("Unhandled error caught: {self}.");
                (
                    status,
                    Json(ErrorResponse::new(ErrorCode::InternalError, self.to_string())),
                )
                    .into_response()
            }
        }
    }
}
