use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use super::jwt::TokenError;

/// Failures at the authorization boundary. Client bodies never carry the
/// underlying token error.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no bearer credential presented")]
    Unauthenticated,
    #[error("access credential rejected: {0}")]
    Forbidden(#[source] TokenError),
    #[error("refresh credential rejected: {0}")]
    InvalidRefresh(#[source] TokenError),
    #[error("token issuance is misconfigured: {0}")]
    Configuration(#[source] TokenError),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::InvalidRefresh(_) => StatusCode::UNAUTHORIZED,
            AuthError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "No token provided",
            AuthError::Forbidden(_) => "Invalid or expired token",
            AuthError::InvalidRefresh(_) => "Invalid or expired refresh token",
            AuthError::Configuration(_) => "Internal server error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Configuration(e) = &self {
            error!(error = %e, "token configuration error");
        }
        let body = Json(json!({ "error": self.public_message() }));
        (self.status(), body).into_response()
    }
}
