use crate::database::DatabaseError;
use crate::models::EventStatus;
use sqlx::Error as SqlxError;
use thiserror::Error;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required creation fields were left empty
    #[error("Validation error: missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Status change refused by the lifecycle rules
    #[error("Invalid transition to {to}: {reason}")]
    InvalidTransition {
        to: EventStatus,
        reason: TransitionError,
    },

    /// A create/update/delete round trip to the event store failed
    #[error("Store operation '{operation}' failed: {reason}")]
    StoreOperationFailed {
        operation: &'static str,
        reason: String,
    },

    /// Not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Unauthorized access errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

/// Why a status change was refused
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("not allowed from {0}")]
    NotAllowedFrom(EventStatus),

    /// Entering delayed needs a non-blank reason
    #[error("a delay reason is required")]
    MissingDelayReason,
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Check if error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    /// Check if the caller can fix the request and resubmit
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AppError::MissingFields(_)
                | AppError::Validation(_)
                | AppError::InvalidTransition { .. }
        )
    }

    /// User-facing, dismissible notice for this error
    pub fn notice(&self) -> String {
        match self {
            AppError::StoreOperationFailed { operation, .. } => {
                format!("Failed to {}. Please try again.", operation)
            }
            AppError::MissingFields(fields) => {
                format!("Please fill in: {}", fields.join(", "))
            }
            AppError::InvalidTransition {
                reason: TransitionError::MissingDelayReason,
                ..
            } => "Please enter a reason for the delay.".to_string(),
            AppError::Unauthorized(_) => "Only administrators can do that.".to_string(),
            other => other.to_string(),
        }
    }
}

/// Errors raised by event and role store adapters
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database query error
    #[error("Query error: {0}")]
    Query(SqlxError),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Stored data could not be mapped onto the domain model
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Store unreachable or closed
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<SqlxError> for StoreError {
    fn from(err: SqlxError) -> Self {
        match &err {
            SqlxError::RowNotFound => StoreError::NotFound("Record not found".to_string()),
            SqlxError::PoolClosed | SqlxError::PoolTimedOut => {
                StoreError::Unavailable(err.to_string())
            }
            _ => StoreError::Query(err),
        }
    }
}

/// Turn a failed lookup into `NotFound`
pub fn option_to_result<T>(opt: Option<T>, what: &str) -> AppResult<T> {
    opt.ok_or_else(|| AppError::NotFound(what.to_string()))
}
