//! Error types and Axum response conversions.

use crate::auth::AuthError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application error types.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Server configuration incomplete")]
    ConfigurationMissing,

    #[error("Missing parameters")]
    MissingParameters,

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ConfigurationMissing => StatusCode::SERVICE_UNAVAILABLE,
            AppError::MissingParameters => StatusCode::BAD_REQUEST,
            AppError::Auth(e) => match e {
                AuthError::InvalidCredentials
                | AuthError::MalformedToken
                | AuthError::ExpiredSession => StatusCode::UNAUTHORIZED,
                AuthError::DeviceMismatch | AuthError::Revoked => StatusCode::FORBIDDEN,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string()
        }));

        (self.status(), body).into_response()
    }
}
