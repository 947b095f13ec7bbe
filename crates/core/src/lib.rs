//! `smartquota-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the error taxonomy, identifiers, normalized emails, the supported currency
//! set and calendar periods.

pub mod currency;
pub mod email;
pub mod error;
pub mod id;
pub mod input;
pub mod period;

pub use currency::{Currency, CurrencyInfo, UNSUPPORTED_CURRENCY};
pub use email::Email;
pub use error::{DomainError, DomainResult};
pub use id::{ClientId, new_entry_id};
pub use period::Period;
