//! Ledger engine.
//!
//! Owns the daily allocation algorithm, the two-phase transaction admission
//! (preflight, then commit with an optional buffer override) and the
//! day-close computation. The engine works on a single [`DailyBudget`]; the
//! session decides which budget is current and when to roll over.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

use crate::Amount;
use crate::model::{Category, CategoryMap, DailyHabits, NewTransaction, Transaction, TxId};

mod state;
pub use state::DailyBudget;

mod error;
pub use error::AdmissionError;

/// The monthly budget is spread evenly over this many days.
pub const DAYS_PER_MONTH: i64 = 30;

/// Result of the admission preflight for one prospective transaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preflight {
    pub category: Category,
    pub amount: Amount,
    /// Already spent in `category` before this transaction.
    pub category_spent: Amount,
    pub allocation: Amount,
    pub exceeds_category: bool,
    /// Spend so far has reached the early-warning line (80% of usable).
    pub exceeds_daily: bool,
}

impl Preflight {
    pub fn requires_override(&self) -> bool {
        self.exceeds_category || self.exceeds_daily
    }
}

/// Summary of a day-close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayClosing {
    pub date: NaiveDate,
    pub used_from_buffer: Amount,
    /// `buffer - used_from_buffer`; negative when the buffer was overspent.
    pub raw_buffer_balance: Amount,
    /// Amount credited to cumulative savings, never negative.
    pub buffer_savings: Amount,
}

/// Split `usable` across categories.
///
/// With a positive habit total each category gets its proportional share. Shares
/// are floored and the leftover units go to the largest fractional remainders, so
/// the allocations always add up to exactly `usable`. With a zero habit total every
/// category gets an equal share.
pub fn allocate_usable(usable: Amount, habits: &DailyHabits) -> CategoryMap<Amount> {
    let habit_sum: i128 = habits.values().map(|h| h.scaled() as i128).sum();
    let total = usable.scaled() as i128;

    let weights = if habit_sum > 0 {
        CategoryMap::from_fn(|c| habits[c].scaled() as i128)
    } else {
        CategoryMap::from_fn(|_| 1)
    };
    let weight_sum = if habit_sum > 0 {
        habit_sum
    } else {
        Category::ALL.len() as i128
    };

    let mut shares = CategoryMap::from_fn(|c| total * weights[c] / weight_sum);
    let mut leftover = total - shares.values().sum::<i128>();

    let mut by_remainder = Category::ALL;
    by_remainder.sort_by_key(|&c| std::cmp::Reverse(total * weights[c] % weight_sum));
    for category in by_remainder {
        if leftover <= 0 {
            break;
        }
        shares[category] += 1;
        leftover -= 1;
    }

    CategoryMap::from_fn(|c| Amount::from_scaled(shares[c] as i64))
}

impl DailyBudget {
    /// Open a new budget for `date` from the monthly budget and declared habits.
    ///
    /// The daily total is `monthly_budget / 30`, split 80% usable and 20% buffer.
    /// Inputs are assumed validated upstream.
    pub fn allocate(monthly_budget: Amount, habits: &DailyHabits, date: NaiveDate) -> Self {
        let total_amount = monthly_budget.mul_ratio(1, DAYS_PER_MONTH);
        let usable_amount = total_amount.mul_ratio(4, 5);
        let buffer_amount = total_amount - usable_amount;

        Self {
            date,
            total_amount,
            usable_amount,
            buffer_amount,
            category_allocations: allocate_usable(usable_amount, habits),
            spent: Amount::ZERO,
            transactions: Vec::new(),
            is_closed: false,
        }
    }

    /// Spend level at which every further transaction needs an override.
    pub fn warning_line(&self) -> Amount {
        self.usable_amount.mul_ratio(4, 5)
    }

    /// Check whether `tx` fits in its category allocation and whether the day
    /// has already reached the early-warning line.
    pub fn preflight(&self, tx: &NewTransaction) -> Preflight {
        let category_spent = self.category_spent(tx.category);
        let allocation = self.allocation(tx.category);
        Preflight {
            category: tx.category,
            amount: tx.amount,
            category_spent,
            allocation,
            exceeds_category: category_spent
                .checked_add(tx.amount)
                .is_none_or(|total| total > allocation),
            exceeds_daily: self.spent >= self.warning_line(),
        }
    }

    /// Admit a transaction:
    /// - Reject if the budget is closed, the amount is not positive or the
    ///   day's spend would overflow
    /// - Run the preflight; if it flags the transaction, require a non-empty
    ///   override reason and mark the transaction as buffer-funded
    /// - Append the transaction and add its amount to `spent`
    ///
    /// The cap is advisory: once justified, any amount is admitted.
    pub fn admit(
        &mut self,
        id: TxId,
        tx: NewTransaction,
        override_reason: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> Result<&Transaction, AdmissionError> {
        if self.is_closed {
            return Err(AdmissionError::BudgetClosed(self.date));
        }
        if !tx.amount.is_positive() {
            return Err(AdmissionError::NonPositiveAmount(tx.amount));
        }
        let Some(spent) = self.spent.checked_add(tx.amount) else {
            return Err(AdmissionError::AmountOutOfRange(tx.amount));
        };

        let preflight = self.preflight(&tx);
        let buffer_reason = if preflight.requires_override() {
            match override_reason.map(str::trim) {
                None => return Err(AdmissionError::OverrideRequired(preflight)),
                Some("") => return Err(AdmissionError::EmptyOverrideReason),
                Some(reason) => Some(reason),
            }
        } else {
            None
        };

        if let Some(reason) = buffer_reason {
            info!(
                category = %tx.category,
                amount = %tx.amount,
                category_spent = %preflight.category_spent,
                allocation = %preflight.allocation,
                reason,
                "buffer override used"
            );
        }

        let transaction = Transaction {
            id,
            amount: tx.amount,
            category: tx.category,
            description: tx.recorded_description(buffer_reason),
            recipient: tx.recorded_recipient(),
            timestamp,
            use_buffer: buffer_reason.is_some(),
        };
        self.spent = spent;
        self.transactions.push(transaction);

        Ok(&self.transactions[self.transactions.len() - 1])
    }

    /// Close the day:
    /// - Reject if already closed (a closed budget is never mutated again)
    /// - Sum buffer-funded spend and compute what is left of the buffer
    /// - Mark the budget closed
    ///
    /// Buffer overspend does not produce negative savings; the contribution is
    /// clamped at zero.
    pub fn close(&mut self) -> Result<DayClosing, AdmissionError> {
        if self.is_closed {
            return Err(AdmissionError::BudgetClosed(self.date));
        }

        let used_from_buffer = self.used_from_buffer();
        let raw_buffer_balance = self.buffer_amount - used_from_buffer;
        if raw_buffer_balance.is_negative() {
            warn!(
                date = %self.date,
                buffer = %self.buffer_amount,
                used = %used_from_buffer,
                "buffer overspent, savings contribution clamped to zero"
            );
        }

        self.is_closed = true;

        Ok(DayClosing {
            date: self.date,
            used_from_buffer,
            raw_buffer_balance,
            buffer_savings: raw_buffer_balance.clamp_zero(),
        })
    }
}
