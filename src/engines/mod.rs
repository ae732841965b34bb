//! Thin trading policies on top of the selector and the ledger.

pub mod entry;
pub mod exit;
pub mod risk;

pub use entry::EntryEngine;
pub use exit::{should_exit, ExitDecision, ExitPolicy, ExitReason};
pub use risk::{DayStats, RiskEngine, RiskRejection};
