//! HTTP mapping for `AppError`.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use folio_core::AppError;
use serde_json::json;
use std::fmt;

/// `AppError` as an actix response: a status code plus
/// `{ "success": false, "error": "..." }`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError(AppError::validation(msg))
    }

    pub fn unauthorized() -> Self {
        ApiError(AppError::Unauthorized("Admin login required".into()))
    }

    /// What the client gets to read. Storage and internal details stay in the log.
    pub fn public_message(&self) -> String {
        match &self.0 {
            AppError::ValidationError(msg) | AppError::Unauthorized(msg) => msg.clone(),
            AppError::NotFound(..) => self.0.to_string(),
            AppError::Upload(err) => format!("Upload failed: {err}"),
            AppError::Mail(_) => "Your message could not be sent, please try again later".into(),
            AppError::Persistence(_) | AppError::Internal(_) => "Internal server error".into(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Upload(_) | AppError::Mail(_) => StatusCode::BAD_GATEWAY,
            AppError::Persistence(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("request failed: {}", self.0);
        }
        HttpResponse::build(status).json(json!({ "success": false, "error": self.public_message() }))
    }
}
