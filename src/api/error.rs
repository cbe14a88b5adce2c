use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use super::types::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request body: {0}")]
    InvalidRequest(#[from] JsonRejection),
    #[error("inference unavailable: {0:#}")]
    InferenceUnavailable(anyhow::Error),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::InferenceUnavailable(_) => "inference_unavailable",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(rejection) => rejection.status(),
            ApiError::InferenceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.code(),
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
