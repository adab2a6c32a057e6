//! Error types for the ledger engine.

use chrono::NaiveDate;
use thiserror::Error;

use crate::Amount;
use crate::engine::Preflight;

/// Error returned when a transaction or day-close cannot be applied to a
/// [`DailyBudget`](super::DailyBudget).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdmissionError {
    #[error("daily budget for {0} is already closed")]
    BudgetClosed(NaiveDate),

    #[error("transaction amount must be positive, got {0}")]
    NonPositiveAmount(Amount),

    #[error("transaction amount {0} would overflow the day's spend")]
    AmountOutOfRange(Amount),

    #[error(
        "{} spend of {} needs a buffer override: {} already spent of {} allocated",
        .0.category, .0.amount, .0.category_spent, .0.allocation
    )]
    OverrideRequired(Preflight),

    #[error("buffer override reason must not be empty")]
    EmptyOverrideReason,
}
