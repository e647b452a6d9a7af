//! HTTP mapping for `AppError`.
//!
//! The core stays web-framework-free; this newtype gives actix a
//! `ResponseError` without leaking actix types into rm-core.

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use rm_core::AppError;
use serde_json::json;

#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self.0 {
            AppError::NotFound(..) => "not_found",
            AppError::ValidationError(_) => "validation_error",
            AppError::Unauthenticated(_) => "unauthenticated",
            AppError::Forbidden(_) => "forbidden",
            AppError::Conflict(_) => "conflict",
            AppError::InvalidState(_) => "invalid_state",
            AppError::Internal(_) => "internal",
        }
    }
}

impl actix_web::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) | AppError::InvalidState(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Internal(ref msg) = self.0 {
            log::error!("internal error: {msg}");
        }
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.kind(),
            "message": self.0.to_string(),
        }))
    }
}
