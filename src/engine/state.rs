use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Amount;
use crate::model::{Category, CategoryMap, Transaction};

/// One calendar day's budget: the 80/20 split, per-category allocations and
/// every transaction admitted against it.
///
/// Fields are read-only from outside the crate; all mutation goes through the
/// ledger operations in [`crate::engine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBudget {
    pub(crate) date: NaiveDate,
    pub(crate) total_amount: Amount,
    pub(crate) usable_amount: Amount,
    pub(crate) buffer_amount: Amount,
    #[serde(rename = "categories")]
    pub(crate) category_allocations: CategoryMap<Amount>,
    pub(crate) spent: Amount,
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) is_closed: bool,
}

impl DailyBudget {
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn total_amount(&self) -> Amount {
        self.total_amount
    }

    pub fn usable_amount(&self) -> Amount {
        self.usable_amount
    }

    pub fn buffer_amount(&self) -> Amount {
        self.buffer_amount
    }

    pub fn allocations(&self) -> &CategoryMap<Amount> {
        &self.category_allocations
    }

    pub fn allocation(&self, category: Category) -> Amount {
        self.category_allocations[category]
    }

    pub fn spent(&self) -> Amount {
        self.spent
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    /// Sum of amounts admitted through the buffer override.
    pub fn used_from_buffer(&self) -> Amount {
        self.transactions
            .iter()
            .filter(|t| t.use_buffer)
            .map(|t| t.amount)
            .sum()
    }

    pub fn category_spent(&self, category: Category) -> Amount {
        self.transactions
            .iter()
            .filter(|t| t.category == category)
            .map(|t| t.amount)
            .sum()
    }

    /// Allocation left in a category, never below zero.
    pub fn category_remaining(&self, category: Category) -> Amount {
        (self.allocation(category) - self.category_spent(category)).clamp_zero()
    }

    pub fn spending_by_category(&self) -> CategoryMap<Amount> {
        CategoryMap::from_fn(|c| self.category_spent(c))
    }

    /// Spent as a percentage of the usable amount (may exceed 100).
    pub fn used_percentage(&self) -> f64 {
        if !self.usable_amount.is_positive() {
            return 0.0;
        }
        self.spent.to_f64() / self.usable_amount.to_f64() * 100.0
    }
}
