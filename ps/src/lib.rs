//! PlanStore - durable storage for plannings, options and votes
//!
//! A small SQLite-backed store with atomic per-planning save semantics:
//! every `save` writes one planning and all of its rows in a single
//! transaction, so a reload never observes a half-written planning.
//!
//! The store knows nothing about vote rules or lifecycle; it persists rows
//! and hands them back. Callers map rows to their own domain types.

pub mod cli;
mod error;
mod store;

pub use error::StoreError;
pub use store::{OptionRecord, PlanningRecord, Store, StoreCounts, StoredPlanning, VoteRecord};

/// Current time as Unix milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
