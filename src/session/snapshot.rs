use serde::{Deserialize, Serialize};

use crate::Amount;
use crate::engine::DailyBudget;
use crate::model::{DailyHabits, TxId, UserProfile, Wallet};

/// The whole persisted session.
///
/// Missing fields fall back to a fresh session, so partially written or older
/// records still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub is_authenticated: bool,
    pub is_setup_complete: bool,
    pub current_step: u32,
    pub profile: Option<UserProfile>,
    pub daily_habits: Option<DailyHabits>,
    pub wallet: Option<Wallet>,
    pub current_daily_budget: Option<DailyBudget>,
    /// Closed budgets, newest first.
    pub past_budgets: Vec<DailyBudget>,
    pub total_savings: Amount,
    pub next_tx_id: TxId,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            is_authenticated: false,
            is_setup_complete: false,
            current_step: 1,
            profile: None,
            daily_habits: None,
            wallet: None,
            current_daily_budget: None,
            past_budgets: Vec::new(),
            total_savings: Amount::ZERO,
            next_tx_id: 1,
        }
    }
}

impl Snapshot {
    /// Move `next_tx_id` past every stored transaction id, for records
    /// written without the counter.
    pub(crate) fn sync_next_tx_id(&mut self) {
        let max_id = self
            .current_daily_budget
            .iter()
            .chain(&self.past_budgets)
            .flat_map(|budget| budget.transactions())
            .map(|tx| tx.id)
            .max();
        if let Some(max_id) = max_id {
            self.next_tx_id = self.next_tx_id.max(max_id.saturating_add(1));
        }
    }
}
