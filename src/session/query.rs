use chrono::{DateTime, Utc};

use crate::model::{Category, Transaction};

/// Filter over every transaction in the session, current day and history.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    search: Option<String>,
    category: Option<Category>,
    since: Option<DateTime<Utc>>,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive match on description or recipient.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into().trim().to_lowercase();
        self.search = (!term.is_empty()).then_some(term);
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        let search_match = self.search.as_deref().is_none_or(|term| {
            tx.description.to_lowercase().contains(term)
                || tx.recipient.to_lowercase().contains(term)
        });
        let category_match = self.category.is_none_or(|c| tx.category == c);
        let date_match = self.since.is_none_or(|since| tx.timestamp >= since);
        search_match && category_match && date_match
    }
}
