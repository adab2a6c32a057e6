pub mod amount;
pub mod csv;
pub mod engine;
pub mod model;
pub mod session;
pub mod storage;

pub use amount::Amount;
pub use engine::{AdmissionError, DailyBudget, DayClosing, Preflight};
pub use model::{
    Category, CategoryMap, DailyHabits, NewTransaction, Transaction, TxId, UserProfile, Wallet,
};
pub use session::{Command, Outcome, Session, SessionError, Snapshot};
pub use storage::{JsonFileStore, MemoryStore, SnapshotStore, StorageError};
