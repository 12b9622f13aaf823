/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers should return `Result<T, ApiError>` which automatically
/// converts to appropriate HTTP status codes.
///
/// # Example
///
/// ```
/// use membres_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler() -> ApiResult<Json<serde_json::Value>> {
///     let value: i32 = "42".parse().map_err(|_| ApiError::BadRequest("not a number".into()))?;
///     Ok(Json(json!({ "value": value })))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crate::forms::FormError;
use membres_shared::{
    auth::{jwt::JwtError, password::PasswordError, voters::AuthzError},
    lifecycle::LifecycleError,
    services::shift::ShiftError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - e.g., duplicate username or member number
    Conflict(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Message for a unique constraint, by constraint name
fn conflict_message(constraint: &str) -> String {
    match constraint {
        "users_username_key" => "Username already exists".to_string(),
        "users_email_key" => "Email already exists".to_string(),
        "memberships_member_number_key" => "Member number already taken".to_string(),
        "swipe_cards_code_key" => "Swipe card already registered".to_string(),
        "beneficiaries_user_id_key" => "User already has a beneficiary".to_string(),
        "proxies_event_giver_key" => "Proxy already given for this event".to_string(),
        other => format!("Constraint violation: {}", other),
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    if let Some(constraint) = db_err.constraint() {
                        return ApiError::Conflict(conflict_message(constraint));
                    }
                }
                if db_err.is_foreign_key_violation() {
                    return ApiError::BadRequest("Referenced resource does not exist".to_string());
                }

                // Other database errors are internal
                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert request validation errors to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        ApiError::ValidationError(details)
    }
}

/// Convert authorization errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Denied(action) => {
                ApiError::Forbidden(format!("Not allowed to {}", action))
            }
            AuthzError::Unauthenticated => {
                ApiError::Unauthorized("Authentication required".to_string())
            }
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer => ApiError::Unauthorized("Invalid token issuer".to_string()),
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::UserAlreadyPersisted(_) => ApiError::Conflict(err.to_string()),
            LifecycleError::Password(e) => e.into(),
            LifecycleError::DatabaseError(e) => e.into(),
        }
    }
}

impl From<ShiftError> for ApiError {
    fn from(err: ShiftError) -> Self {
        match err {
            ShiftError::NotFound(_) | ShiftError::BeneficiaryNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            ShiftError::Locked | ShiftError::AlreadyStarted | ShiftError::Booking(_) => {
                ApiError::Conflict(err.to_string())
            }
            ShiftError::InvalidWindow => ApiError::BadRequest(err.to_string()),
            ShiftError::DatabaseError(e) => e.into(),
        }
    }
}

impl From<FormError> for ApiError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Unauthenticated => {
                ApiError::Unauthorized("Authentication required".to_string())
            }
            FormError::Validation(errors) => errors.into(),
            FormError::Invalid { field, message } => {
                ApiError::ValidationError(vec![ValidationErrorDetail::new(field, message)])
            }
            FormError::Transform { field, source } => {
                ApiError::ValidationError(vec![ValidationErrorDetail::new(field, source.to_string())])
            }
            FormError::DatabaseError(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use membres_shared::services::shift::BookingError;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Shift not found".to_string());
        assert_eq!(err.to_string(), "Not found: Shift not found");
    }

    #[test]
    fn test_denial_is_forbidden() {
        let err: ApiError = AuthzError::Denied("delete".to_string()).into();
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_booking_error_is_conflict() {
        let err: ApiError = ShiftError::Booking(BookingError::AlreadyBooked).into();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);

        let err: ApiError = ShiftError::InvalidWindow.into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_conflict_messages() {
        assert_eq!(conflict_message("memberships_member_number_key"), "Member number already taken");
        assert_eq!(conflict_message("other_key"), "Constraint violation: other_key");
    }
}
