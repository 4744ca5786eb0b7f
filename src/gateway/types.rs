//! API Response types and error codes
//!
//! - `ApiResponse<T>`: Unified response wrapper
//! - `ApiError`: Rejection rendered as status + envelope
//! - `error_codes`: Numeric error code constants

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::core_types::{Points, UserId};
use crate::error::LedgerError;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or null (error)
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

// ============================================================================
// Error Codes
// ============================================================================

pub mod error_codes {
    pub const SUCCESS: i32 = 0;

    // Client errors
    pub const INVALID_ARGUMENT: i32 = -1001;

    // Ledger rejections
    pub const INSUFFICIENT_POINTS: i32 = -2001;
    pub const USER_NOT_FOUND: i32 = -2002;
    pub const OVER_CAP: i32 = -2003;

    // Server errors
    pub const STORE_ERROR: i32 = -5000;
    pub const LOCK_TIMEOUT: i32 = -5001;
}

// ============================================================================
// ApiError
// ============================================================================

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Wrap `data` in a success envelope
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let code = match &e {
            LedgerError::InvalidArgument(_) => error_codes::INVALID_ARGUMENT,
            LedgerError::Insufficient { .. } => error_codes::INSUFFICIENT_POINTS,
            LedgerError::UserNotFound { .. } => error_codes::USER_NOT_FOUND,
            LedgerError::OverCap { .. } => error_codes::OVER_CAP,
            LedgerError::Store(_) => error_codes::STORE_ERROR,
            LedgerError::LockTimeout { .. } => error_codes::LOCK_TIMEOUT,
        };
        Self {
            status,
            code,
            msg: e.to_string(),
        }
    }
}

/// Unreadable request bodies keep axum's status but use the envelope
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            code: error_codes::INVALID_ARGUMENT,
            msg: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ApiResponse::<()>::error(self.code, self.msg)),
        )
            .into_response()
    }
}

// ============================================================================
// Boundary validation
// ============================================================================

/// User ids must be positive
pub fn validate_user_id(raw: i64) -> Result<UserId, LedgerError> {
    if raw < 1 {
        return Err(LedgerError::InvalidArgument(format!(
            "user id must be at least 1, got {}",
            raw
        )));
    }
    Ok(raw as UserId)
}

/// Amounts must be non-negative
pub fn validate_amount(raw: i64) -> Result<Points, LedgerError> {
    if raw < 0 {
        return Err(LedgerError::InvalidArgument(format!(
            "amount must be at least 0, got {}",
            raw
        )));
    }
    Ok(raw)
}
