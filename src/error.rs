//! Error types for the lending desk

use std::fmt;

use thiserror::Error;

/// Stable numeric codes shown to the operator next to error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    DbFailure = 3,
    NoSuchMember = 4,
    NoSuchBook = 5,
    BookNotAvailable = 7,
    Duplicate = 8,
    MaxLoansReached = 11,
    BadValue = 18,
    NoSuchLoan = 20,
    HasOpenLoans = 21,
}

/// Kind of record a lookup was about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Book,
    Member,
    Loan,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Book => "book",
            Entity::Member => "member",
            Entity::Loan => "loan",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("No {entity} found for {key}")]
    NotFound { entity: Entity, key: String },

    #[error("No copies of book {book} are available")]
    Unavailable { book: i64 },

    #[error("Member {member} has reached the loan limit ({open}/{cap})")]
    LimitExceeded { member: i64, open: i64, cap: i64 },

    #[error("Invalid value for {field}")]
    InvalidInput { field: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("The {entity} {key} still has open loans")]
    HasOpenLoans { entity: Entity, key: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn not_found(entity: Entity, key: impl fmt::Display) -> Self {
        AppError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn invalid_input(field: impl Into<String>) -> Self {
        AppError::InvalidInput {
            field: field.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound { .. })
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::NotFound { entity, .. } => match entity {
                Entity::Book => ErrorCode::NoSuchBook,
                Entity::Member => ErrorCode::NoSuchMember,
                Entity::Loan => ErrorCode::NoSuchLoan,
            },
            AppError::Unavailable { .. } => ErrorCode::BookNotAvailable,
            AppError::LimitExceeded { .. } => ErrorCode::MaxLoansReached,
            AppError::InvalidInput { .. } | AppError::Validation(_) => ErrorCode::BadValue,
            AppError::Conflict(_) => ErrorCode::Duplicate,
            AppError::HasOpenLoans { .. } => ErrorCode::HasOpenLoans,
            AppError::Database(_) | AppError::Migration(_) => ErrorCode::DbFailure,
            AppError::Config(_) | AppError::Io(_) => ErrorCode::Failure,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
