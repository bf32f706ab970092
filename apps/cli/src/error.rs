//! # API Error Type
//!
//! Unified error type for CLI commands, and the HTTP status each failure
//! would map to behind a web boundary.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Bizdesk                                │
//! │                                                                         │
//! │  bizdesk invoice pay <id> --method cash                                │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function  Result<T, ApiError>                           │  │
//! │  │         │                                                        │  │
//! │  │  DbError::NotFound ─────────────────► NOT_FOUND          404     │  │
//! │  │  CoreError::Validation ─────────────► VALIDATION_ERROR   400     │  │
//! │  │  CoreError::InvalidTransition ──────► INVALID_TRANSITION 400     │  │
//! │  │  CoreError::DocumentLocked ─────────► DOCUMENT_LOCKED    400     │  │
//! │  │  DbError::Conflict / UniqueViolation► CONFLICT           409     │  │
//! │  │  other storage failures ────────────► DATABASE_ERROR     500     │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  stderr: { "code": "INVALID_TRANSITION", "status": 400, "message": … } │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bizdesk_core::{CoreError, ValidationError};
use bizdesk_db::DbError;
use serde::Serialize;

use crate::config::ConfigError;

/// API error returned from commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "status": 404,
///   "message": "Invoice not found: 9b2c…"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// HTTP status equivalent of `code`
    pub status: u16,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Lifecycle transition not allowed (400)
    InvalidTransition,

    /// Document is paid, cancelled, accepted or rejected (400)
    DocumentLocked,

    /// Input file missing or not valid JSON (400)
    InvalidInput,

    /// Number already taken or allocation kept colliding (409)
    Conflict,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal error (500)
    Internal,
}

impl ErrorCode {
    /// The HTTP status this code maps to.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorCode::NotFound => 404,
            ErrorCode::ValidationError
            | ErrorCode::InvalidTransition
            | ErrorCode::DocumentLocked
            | ErrorCode::InvalidInput => 400,
            ErrorCode::Conflict => 409,
            ErrorCode::DatabaseError | ErrorCode::Internal => 500,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            status: code.status_code(),
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::InvalidInput, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::Conflict { message } => ApiError::new(ErrorCode::Conflict, message),
            DbError::ForeignKeyViolation { message } => {
                tracing::debug!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference: client or project does not exist")
            }
            DbError::Domain(core) => core.into(),
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            err @ DbError::Corrupt { .. } => {
                tracing::error!("{}", err);
                ApiError::new(ErrorCode::DatabaseError, err.to_string())
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => e.into(),
            e @ CoreError::InvalidTransition { .. } => {
                ApiError::new(ErrorCode::InvalidTransition, e.to_string())
            }
            e @ CoreError::DocumentLocked { .. } => {
                ApiError::new(ErrorCode::DocumentLocked, e.to_string())
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::invalid_input(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::invalid_input(format!("Invalid JSON: {}", err))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found: ApiError = DbError::not_found("Invoice", "x").into();
        assert_eq!(not_found.code, ErrorCode::NotFound);
        assert_eq!(not_found.status_code(), 404);

        let conflict: ApiError = DbError::conflict("taken").into();
        assert_eq!(conflict.status_code(), 409);

        let transition: ApiError = DbError::Domain(CoreError::InvalidTransition {
            from: "paid".to_string(),
            to: "sent".to_string(),
        })
        .into();
        assert_eq!(transition.code, ErrorCode::InvalidTransition);
        assert_eq!(transition.status_code(), 400);

        let locked: ApiError = CoreError::DocumentLocked {
            document: "INV-202401-0001".to_string(),
            status: "paid".to_string(),
        }
        .into();
        assert_eq!(locked.status_code(), 400);

        let storage: ApiError = DbError::PoolExhausted.into();
        assert_eq!(storage.status_code(), 500);
    }

    #[test]
    fn test_validation_message_is_kept() {
        let err: ApiError = DbError::from(ValidationError::Required {
            field: "title".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("title"));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::not_found("Invoice", "42")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["status"], 404);
        assert_eq!(json["message"], "Invoice not found: 42");
    }
}
