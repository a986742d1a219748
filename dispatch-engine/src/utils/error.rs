//! Unified HTTP error handling
//!
//! Maps [`EngineError`] onto status codes and a stable `{code, message,
//! data}` envelope so UI clients can pattern-match the code and pick
//! their own copy. Expected races (`OFFER_EXPIRED`,
//! `OFFER_ALREADY_RESOLVED`) come back as client-visible conflicts, not
//! server errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shared::EngineError;
use shared::error::ErrorCode;

/// API response envelope
///
/// ```json
/// {
///   "code": "OK",
///   "message": "success",
///   "data": { ... }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    /// Machine-readable code ("OK" on success)
    pub code: String,
    /// Human-oriented message
    pub message: String,
    /// Response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Application error: a domain error or a malformed request
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Invalid request: {0}")]
    Invalid(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Engine(err) => {
                let status = match err.code() {
                    ErrorCode::Validation => StatusCode::BAD_REQUEST,
                    ErrorCode::NotFound => StatusCode::NOT_FOUND,
                    ErrorCode::DuplicateOrder => StatusCode::CONFLICT,
                    ErrorCode::ConcurrentModification => StatusCode::CONFLICT,
                    ErrorCode::OfferAlreadyResolved => StatusCode::CONFLICT,
                    ErrorCode::OfferExpired => StatusCode::GONE,
                    ErrorCode::InvalidTransition => StatusCode::UNPROCESSABLE_ENTITY,
                };
                let code = serde_json::to_value(err.code())
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_else(|| "INTERNAL_ERROR".to_string());
                (status, code, err.to_string())
            }
            AppError::Invalid(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST".to_string(), msg.clone())
            }
        };

        let body = Json(AppResponse::<()> {
            code,
            message,
            data: None,
        });
        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<AppResponse<T>> {
    Json(AppResponse {
        code: "OK".to_string(),
        message: "success".to_string(),
        data: Some(data),
    })
}
