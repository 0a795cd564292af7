use rusqlite::ErrorCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },

    #[error("transaction failed: {0}")]
    Transaction(#[source] rusqlite::Error),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn validation_with(message: impl Into<String>, details: Value) -> Self {
        StoreError::Validation {
            message: message.into(),
            details: Some(details),
        }
    }

    /// Wire code used by the request layer.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "not_found",
            StoreError::Duplicate(_) => "duplicate",
            StoreError::Conflict(_) => "conflict",
            StoreError::Validation { .. } => "bad_params",
            StoreError::Transaction(_) => "db_tx_failed",
            StoreError::Db(_) => "db_query_failed",
            StoreError::Json(_) => "bad_json",
        }
    }

    pub fn details(&self) -> Option<Value> {
        match self {
            StoreError::NotFound { entity, id } => {
                Some(serde_json::json!({ "entity": entity, "id": id }))
            }
            StoreError::Validation { details, .. } => details.clone(),
            _ => None,
        }
    }
}

/// True when the error is a UNIQUE / PRIMARY KEY violation.
pub fn is_unique_violation(e: &rusqlite::Error) -> bool {
    match e {
        rusqlite::Error::SqliteFailure(f, _) => {
            f.code == ErrorCode::ConstraintViolation
                && matches!(
                    f.extended_code,
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                        | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                )
        }
        _ => false,
    }
}

/// Maps a uniqueness failure on a single-statement write to `Duplicate`.
pub fn map_unique(e: rusqlite::Error, message: impl Into<String>) -> StoreError {
    if is_unique_violation(&e) {
        StoreError::Duplicate(message.into())
    } else {
        StoreError::Db(e)
    }
}
