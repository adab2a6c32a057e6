//! Session state store.
//!
//! A [`Session`] owns the one mutable [`Snapshot`] of the user's session and is
//! the only way to change it. Every mutation is a [`Command`]; each command
//! either applies completely, is ignored (benign precondition miss such as
//! spending with no open day), or fails validation and leaves the snapshot
//! untouched. Applied commands are persisted through the [`SnapshotStore`].
//!
//! The store is single-owner: concurrent producers must funnel commands
//! through [`Session::run`].

use chrono::{Local, NaiveDate, Utc};
use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use crate::Amount;
use crate::engine::{AdmissionError, DAYS_PER_MONTH, DailyBudget, DayClosing};
use crate::model::{DailyHabits, NewTransaction, Transaction, UserProfile, Wallet};
use crate::storage::{SnapshotStore, StorageError};

mod error;
pub use error::{SessionError, ValidationError};

mod query;
pub use query::TransactionFilter;

mod snapshot;
pub use snapshot::Snapshot;

/// A mutation request against the session.
#[derive(Debug, Clone)]
pub enum Command {
    Login,
    /// Clear the session and purge persisted storage.
    Logout,
    InitializeProfile(UserProfile),
    SetHabits(DailyHabits),
    /// Record the wallet balance and open the day's budget.
    InitializeWallet(Amount),
    SubmitTransaction {
        transaction: NewTransaction,
        override_reason: Option<String>,
    },
    CloseDay,
    AdvanceStep,
    RetreatStep,
    ResetSteps,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Login => "login",
            Command::Logout => "logout",
            Command::InitializeProfile(_) => "initialize profile",
            Command::SetHabits(_) => "set habits",
            Command::InitializeWallet(_) => "initialize wallet",
            Command::SubmitTransaction { .. } => "submit transaction",
            Command::CloseDay => "close day",
            Command::AdvanceStep => "advance step",
            Command::RetreatStep => "retreat step",
            Command::ResetSteps => "reset steps",
        }
    }
}

/// What happened to a command that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Ignored(Ignored),
}

/// Why a command was a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    NoActiveBudget,
    BudgetClosed,
}

impl std::fmt::Display for Ignored {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ignored::NoActiveBudget => f.write_str("no active daily budget"),
            Ignored::BudgetClosed => f.write_str("daily budget is already closed"),
        }
    }
}

/// Owner of the session snapshot.
pub struct Session<S> {
    snapshot: Snapshot,
    store: S,
}

/// Public API
impl<S: SnapshotStore> Session<S> {
    /// Open a session from the store; no stored record means a fresh session.
    pub fn open(store: S) -> Result<Self, StorageError> {
        let mut snapshot = store.load()?.unwrap_or_default();
        snapshot.sync_next_tx_id();
        Ok(Self { snapshot, store })
    }

    /// Run the session over a stream of commands, one at a time.
    pub async fn run(&mut self, mut commands: impl Stream<Item = Command> + Unpin) {
        while let Some(command) = commands.next().await {
            // a rejected command must not stop the session; it is already logged
            let _ = self.apply(command);
        }
    }

    /// Apply a single command on top of the current snapshot.
    pub fn apply(&mut self, command: Command) -> Result<Outcome, SessionError> {
        let name = command.name();
        // logout purges storage itself; everything else is saved once applied
        let persists = !matches!(command, Command::Logout);
        let result = match command {
            Command::Login => self.login(),
            Command::Logout => self.logout(),
            Command::InitializeProfile(profile) => self.initialize_profile(profile),
            Command::SetHabits(habits) => self.set_habits(habits),
            Command::InitializeWallet(amount) => self.initialize_wallet(amount),
            Command::SubmitTransaction {
                transaction,
                override_reason,
            } => self.submit_transaction(transaction, override_reason.as_deref()),
            Command::CloseDay => self.close_day(),
            Command::AdvanceStep => self.advance_step(),
            Command::RetreatStep => self.retreat_step(),
            Command::ResetSteps => self.reset_steps(),
        };
        Self::log_result(name, &result);

        if persists && matches!(result, Ok(Outcome::Applied)) {
            self.persist();
        }
        result
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot.is_authenticated
    }

    pub fn is_setup_complete(&self) -> bool {
        self.snapshot.is_setup_complete
    }

    pub fn current_step(&self) -> u32 {
        self.snapshot.current_step
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.snapshot.profile.as_ref()
    }

    pub fn habits(&self) -> Option<&DailyHabits> {
        self.snapshot.daily_habits.as_ref()
    }

    pub fn wallet(&self) -> Option<Wallet> {
        self.snapshot.wallet
    }

    pub fn current_budget(&self) -> Option<&DailyBudget> {
        self.snapshot.current_daily_budget.as_ref()
    }

    /// Closed budgets, newest first.
    pub fn history(&self) -> &[DailyBudget] {
        &self.snapshot.past_budgets
    }

    pub fn total_savings(&self) -> Amount {
        self.snapshot.total_savings
    }

    /// Transactions from the current day and history matching `filter`,
    /// newest first.
    pub fn transactions(&self, filter: &TransactionFilter) -> Vec<&Transaction> {
        let mut found: Vec<&Transaction> = self
            .snapshot
            .current_daily_budget
            .iter()
            .chain(self.snapshot.past_budgets.iter())
            .flat_map(|budget| budget.transactions())
            .filter(|tx| filter.matches(tx))
            .collect();
        found.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        found
    }
}

/// Private API
impl<S: SnapshotStore> Session<S> {
    fn log_result(command: &str, result: &Result<Outcome, SessionError>) {
        match result {
            Ok(Outcome::Applied) => info!("{command} applied"),
            Ok(Outcome::Ignored(reason)) => info!(%reason, "{command} ignored"),
            Err(e) => info!(reason = %e, "{command} skipped"),
        }
    }

    /// Best effort: a failed save is logged and the in-memory state is kept.
    fn persist(&mut self) {
        if !self.snapshot.is_authenticated {
            return;
        }
        if let Err(e) = self.store.save(&self.snapshot) {
            warn!(error = %e, "failed to persist session snapshot");
        }
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// Budget for today from the stored profile and habits, if both are set.
    fn open_budget(&self) -> Option<DailyBudget> {
        let profile = self.snapshot.profile.as_ref()?;
        let habits = self.snapshot.daily_habits.as_ref()?;
        Some(DailyBudget::allocate(
            profile.monthly_budget,
            habits,
            Self::today(),
        ))
    }

    fn login(&mut self) -> Result<Outcome, SessionError> {
        self.snapshot.is_authenticated = true;
        Ok(Outcome::Applied)
    }

    fn logout(&mut self) -> Result<Outcome, SessionError> {
        self.snapshot = Snapshot::default();
        if let Err(e) = self.store.purge() {
            warn!(error = %e, "failed to purge stored session");
        }
        Ok(Outcome::Applied)
    }

    /// Validate and store the profile:
    /// - All text fields non-empty, age positive
    /// - Income and budget positive, budget not above income
    fn initialize_profile(&mut self, profile: UserProfile) -> Result<Outcome, SessionError> {
        if profile.name.trim().is_empty() {
            return Err(ValidationError::EmptyField("name").into());
        }
        if profile.contact.trim().is_empty() {
            return Err(ValidationError::EmptyField("contact").into());
        }
        if profile.age == 0 {
            return Err(ValidationError::InvalidAge.into());
        }
        if !profile.monthly_income.is_positive() {
            return Err(
                ValidationError::NonPositive("monthly income", profile.monthly_income).into(),
            );
        }
        if !profile.monthly_budget.is_positive() {
            return Err(
                ValidationError::NonPositive("monthly budget", profile.monthly_budget).into(),
            );
        }
        if profile.monthly_budget > profile.monthly_income {
            return Err(ValidationError::BudgetExceedsIncome {
                budget: profile.monthly_budget,
                income: profile.monthly_income,
            }
            .into());
        }

        self.snapshot.profile = Some(profile);
        self.snapshot.current_step = self.snapshot.current_step.saturating_add(1);
        Ok(Outcome::Applied)
    }

    /// Validate and store habits, then mark setup complete:
    /// - No negative amounts
    /// - With a profile present, the habit total must fit in the daily budget
    fn set_habits(&mut self, habits: DailyHabits) -> Result<Outcome, SessionError> {
        if let Some((category, amount)) = habits.iter().find(|(_, a)| a.is_negative()) {
            return Err(ValidationError::NegativeHabit(category, *amount).into());
        }
        if let Some(profile) = &self.snapshot.profile {
            let total: Amount = habits.values().sum();
            let daily = profile.monthly_budget.mul_ratio(1, DAYS_PER_MONTH);
            if total > daily {
                return Err(ValidationError::HabitsExceedDailyBudget { total, daily }.into());
            }
        }

        self.snapshot.daily_habits = Some(habits);
        self.snapshot.is_setup_complete = true;
        self.snapshot.current_step = self.snapshot.current_step.saturating_add(1);
        Ok(Outcome::Applied)
    }

    /// Record the wallet and open today's budget when profile and habits exist.
    ///
    /// The amount must be positive and, with a profile present, not above the
    /// monthly budget. An open budget that already holds transactions is kept
    /// as is.
    fn initialize_wallet(&mut self, amount: Amount) -> Result<Outcome, SessionError> {
        if !amount.is_positive() {
            return Err(ValidationError::NonPositive("wallet amount", amount).into());
        }
        if let Some(budget) = self.snapshot.profile.as_ref().map(|p| p.monthly_budget) {
            if amount > budget {
                return Err(ValidationError::WalletExceedsBudget { amount, budget }.into());
            }
        }

        let keep_current = self
            .snapshot
            .current_daily_budget
            .as_ref()
            .is_some_and(|b| !b.is_closed() && !b.transactions().is_empty());
        if keep_current {
            info!("open daily budget has transactions, keeping it");
        } else if let Some(budget) = self.open_budget() {
            self.snapshot.current_daily_budget = Some(budget);
        }

        self.snapshot.wallet = Some(Wallet { balance: amount });
        self.snapshot.current_step = self.snapshot.current_step.saturating_add(1);
        Ok(Outcome::Applied)
    }

    fn submit_transaction(
        &mut self,
        transaction: NewTransaction,
        override_reason: Option<&str>,
    ) -> Result<Outcome, SessionError> {
        let id = self.snapshot.next_tx_id;
        let Some(budget) = self.snapshot.current_daily_budget.as_mut() else {
            return Ok(Outcome::Ignored(Ignored::NoActiveBudget));
        };

        match budget.admit(id, transaction, override_reason, Utc::now()) {
            Ok(tx) => {
                info!(
                    tx = tx.id,
                    category = %tx.category,
                    amount = %tx.amount,
                    use_buffer = tx.use_buffer,
                    "transaction recorded"
                );
            }
            Err(AdmissionError::BudgetClosed(_)) => {
                return Ok(Outcome::Ignored(Ignored::BudgetClosed));
            }
            Err(e) => return Err(e.into()),
        }

        self.snapshot.next_tx_id += 1;
        Ok(Outcome::Applied)
    }

    /// Close the current day:
    /// - Close the budget and move it to the front of history
    /// - Add the clamped buffer savings to the running total
    /// - Open the next budget from the same profile and habits
    fn close_day(&mut self) -> Result<Outcome, SessionError> {
        let Some(mut budget) = self.snapshot.current_daily_budget.take() else {
            return Ok(Outcome::Ignored(Ignored::NoActiveBudget));
        };

        let DayClosing {
            date,
            buffer_savings,
            ..
        } = match budget.close() {
            Ok(closing) => closing,
            Err(_) => {
                self.snapshot.current_daily_budget = Some(budget);
                return Ok(Outcome::Ignored(Ignored::BudgetClosed));
            }
        };

        info!(%date, spent = %budget.spent(), savings = %buffer_savings, "day closed");
        self.snapshot.past_budgets.insert(0, budget);
        self.snapshot.total_savings += buffer_savings;
        self.snapshot.current_daily_budget = self.open_budget();
        Ok(Outcome::Applied)
    }

    fn advance_step(&mut self) -> Result<Outcome, SessionError> {
        self.snapshot.current_step = self.snapshot.current_step.saturating_add(1);
        Ok(Outcome::Applied)
    }

    fn retreat_step(&mut self) -> Result<Outcome, SessionError> {
        self.snapshot.current_step = self.snapshot.current_step.saturating_sub(1).max(1);
        Ok(Outcome::Applied)
    }

    fn reset_steps(&mut self) -> Result<Outcome, SessionError> {
        self.snapshot.current_step = 1;
        Ok(Outcome::Applied)
    }
}
