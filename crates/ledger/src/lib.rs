//! Monthly income/expense ledger.
//!
//! Buckets are addressed by `(owner email, period)` and replaced wholesale;
//! summaries are computed from the current lists on demand.

pub mod bucket;
pub mod service;
pub mod store;

pub use bucket::{Bucket, DEFAULT_CATEGORY, ExpenseEntry, IncomeEntry, Summary};
pub use service::{EntryKind, LedgerService};
pub use store::{InMemoryLedgerStore, LedgerStore};
