//! Error types for session mutations.

use thiserror::Error;

use crate::Amount;
use crate::engine::AdmissionError;
use crate::model::Category;

/// Top-level error returned by [`Session::apply`](super::Session::apply).
///
/// Any error leaves the session unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("transaction rejected: {0}")]
    Admission(#[from] AdmissionError),
}

/// Rejected caller input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("{0} must be positive, got {1}")]
    NonPositive(&'static str, Amount),

    #[error("age must be positive")]
    InvalidAge,

    #[error("monthly budget {budget} cannot be greater than monthly income {income}")]
    BudgetExceedsIncome { budget: Amount, income: Amount },

    #[error("habit amount for {0} must not be negative, got {1}")]
    NegativeHabit(Category, Amount),

    #[error("wallet amount {amount} cannot exceed the monthly budget {budget}")]
    WalletExceedsBudget { amount: Amount, budget: Amount },

    #[error("total daily habits {total} exceed the daily budget {daily}")]
    HabitsExceedDailyBudget { total: Amount, daily: Amount },
}
