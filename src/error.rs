//! Error type shared by every ledger operation.

use rust_decimal::Decimal;
use sea_orm::DbErr;
use std::time::Duration;
use thiserror::Error;

use crate::entities::sea_orm_active_enums::DealStatus;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition { from: DealStatus, to: DealStatus },

    #[error("insufficient balance: {balance} available, {requested} requested")]
    InsufficientBalance { balance: Decimal, requested: Decimal },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    /// Whether the caller may safely retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Timeout(_) | CoreError::Conflict(_))
    }

    /// Stable upper-snake code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::InvalidTransition { .. } => "INVALID_TRANSITION",
            CoreError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            CoreError::Validation(_) => "VALIDATION_ERROR",
            CoreError::Conflict(_) => "CONFLICT",
            CoreError::Timeout(_) => "TIMEOUT",
            CoreError::Database(_) => "DATABASE_ERROR",
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_retryable_kinds() {
        assert!(CoreError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(CoreError::Conflict("dup".into()).is_retryable());
        assert!(!CoreError::validation("bad").is_retryable());
        assert!(!CoreError::not_found("deal", "x").is_retryable());
    }

    #[test]
    fn test_messages() {
        let err = CoreError::InsufficientBalance {
            balance: dec!(50),
            requested: dec!(75),
        };
        assert_eq!(
            err.to_string(),
            "insufficient balance: 50 available, 75 requested"
        );

        let err = CoreError::InvalidTransition {
            from: DealStatus::Expired,
            to: DealStatus::Active,
        };
        assert_eq!(err.to_string(), "invalid status transition from expired to active");
        assert_eq!(err.code(), "INVALID_TRANSITION");
    }
}
