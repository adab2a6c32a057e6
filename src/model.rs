//! Core domain types for the daily budget ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use crate::Amount;

/// Transaction identifier, monotonically assigned by the session.
pub type TxId = u64;

/// The fixed set of spending categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Tiffin,
    Lunch,
    Dinner,
    Transport,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Tiffin,
        Category::Lunch,
        Category::Dinner,
        Category::Transport,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Tiffin => "tiffin",
            Category::Lunch => "lunch",
            Category::Dinner => "dinner",
            Category::Transport => "transport",
            Category::Other => "other",
        }
    }

    /// Label shown to users when picking a category.
    pub fn label(self) -> &'static str {
        match self {
            Category::Tiffin => "Tiffin (Breakfast/Snacks)",
            Category::Lunch => "Lunch",
            Category::Dinner => "Dinner",
            Category::Transport => "Transport",
            Category::Other => "Other",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown spending category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// A value for every [`Category`]; no category can be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryMap<T>([T; 5]);

impl<T> CategoryMap<T> {
    pub fn from_fn(mut f: impl FnMut(Category) -> T) -> Self {
        CategoryMap(Category::ALL.map(&mut f))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> + '_ {
        Category::ALL.into_iter().zip(self.0.iter())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.0.iter()
    }
}

impl<T> Index<Category> for CategoryMap<T> {
    type Output = T;

    fn index(&self, category: Category) -> &T {
        &self.0[category.index()]
    }
}

impl<T> IndexMut<Category> for CategoryMap<T> {
    fn index_mut(&mut self, category: Category) -> &mut T {
        &mut self.0[category.index()]
    }
}

// Serialized as `{"tiffin": .., "lunch": .., ...}` so snapshots stay readable.
#[derive(Serialize, Deserialize)]
struct Named<T> {
    tiffin: T,
    lunch: T,
    dinner: T,
    transport: T,
    other: T,
}

impl<T: Serialize> Serialize for CategoryMap<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let [tiffin, lunch, dinner, transport, other] = &self.0;
        Named {
            tiffin,
            lunch,
            dinner,
            transport,
            other,
        }
        .serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for CategoryMap<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let named = Named::<T>::deserialize(deserializer)?;
        Ok(CategoryMap([
            named.tiffin,
            named.lunch,
            named.dinner,
            named.transport,
            named.other,
        ]))
    }
}

/// Declared typical spend per category, used only as allocation weights.
pub type DailyHabits = CategoryMap<Amount>;

/// Onboarding profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub age: u32,
    pub contact: String,
    pub monthly_income: Amount,
    pub monthly_budget: Amount,
}

/// User-declared starting balance. Advisory only: spending never decrements it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub balance: Amount,
}

/// A spend recorded against a daily budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TxId,
    pub amount: Amount,
    pub category: Category,
    pub description: String,
    pub recipient: String,
    pub timestamp: DateTime<Utc>,
    /// Set when the transaction was admitted through the buffer override.
    pub use_buffer: bool,
}

/// The caller-supplied part of a transaction, before admission.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub amount: Amount,
    pub category: Category,
    pub description: String,
    pub recipient: String,
}

impl NewTransaction {
    pub fn new(amount: Amount, category: Category) -> Self {
        Self {
            amount,
            category,
            description: String::new(),
            recipient: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = recipient.into();
        self
    }

    /// Description as it will be recorded, with the override reason appended
    /// when the buffer was used.
    pub(crate) fn recorded_description(&self, buffer_reason: Option<&str>) -> String {
        let base = match self.description.trim() {
            "" => format!("Expense for {}", self.category),
            description => description.to_string(),
        };
        match buffer_reason {
            Some(reason) => format!("{base} (Buffer used: {})", reason.trim()),
            None => base,
        }
    }

    pub(crate) fn recorded_recipient(&self) -> String {
        match self.recipient.trim() {
            "" => "Not specified".to_string(),
            recipient => recipient.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("Lunch".parse::<Category>().unwrap(), Category::Lunch);
        assert_eq!(" transport ".parse::<Category>().unwrap(), Category::Transport);
        assert_eq!(
            "brunch".parse::<Category>(),
            Err(UnknownCategory("brunch".to_string()))
        );
    }

    #[test]
    fn category_labels() {
        assert_eq!(Category::Tiffin.label(), "Tiffin (Breakfast/Snacks)");
        assert_eq!(Category::Other.to_string(), "other");
    }

    #[test]
    fn category_map_indexes_by_category() {
        let mut map = CategoryMap::from_fn(|c| c.as_str().len());
        assert_eq!(map[Category::Tiffin], 6);
        map[Category::Other] = 42;
        assert_eq!(map[Category::Other], 42);
        assert_eq!(map.iter().count(), 5);
    }

    #[test]
    fn category_map_serializes_as_object() {
        let habits: DailyHabits = CategoryMap::from_fn(|c| match c {
            Category::Lunch => Amount::from_float(20.0),
            _ => Amount::ZERO,
        });
        let json = serde_json::to_string(&habits).unwrap();
        assert_eq!(
            json,
            r#"{"tiffin":0.0,"lunch":20.0,"dinner":0.0,"transport":0.0,"other":0.0}"#
        );
        let back: DailyHabits = serde_json::from_str(&json).unwrap();
        assert_eq!(back, habits);
    }

    #[test]
    fn category_map_rejects_missing_category() {
        let json = r#"{"tiffin":1,"lunch":2,"dinner":3,"transport":4}"#;
        let err = serde_json::from_str::<DailyHabits>(json).unwrap_err();
        assert!(err.to_string().contains("missing field `other`"));
    }

    #[test]
    fn recorded_description_defaults_and_appends_reason() {
        let tx = NewTransaction::new(Amount::from_float(5.0), Category::Dinner);
        assert_eq!(tx.recorded_description(None), "Expense for dinner");
        assert_eq!(tx.recorded_recipient(), "Not specified");

        let tx = tx.with_description("Pizza").with_recipient("Luigi's");
        assert_eq!(
            tx.recorded_description(Some("friend's birthday")),
            "Pizza (Buffer used: friend's birthday)"
        );
        assert_eq!(tx.recorded_recipient(), "Luigi's");
    }
}
