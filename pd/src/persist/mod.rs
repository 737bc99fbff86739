//! Persistence adapter
//!
//! The engine consumes durable storage through one narrow interface: save a
//! planning atomically, load everything at process start. Writes happen
//! synchronously with respect to the mutation that caused them - the engine
//! acknowledges a mutation only after `save` returned, so a crash after
//! success never loses a vote.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use thiserror::Error;

use crate::domain::{Planning, VoteLedger};

/// Failure inside a storage backend. The engine surfaces it as
/// `EngineError::Persistence` and rolls the in-memory mutation back.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct PersistError(pub String);

/// Durable storage as the engine sees it
pub trait PlanningStore: Send + Sync {
    /// Durably write one planning and its votes. Must be atomic per
    /// planning: a reload never observes a partial write.
    fn save(&self, planning: &Planning, ledger: &VoteLedger) -> Result<(), PersistError>;

    /// Everything the store holds, for registry construction at startup.
    fn load_all(&self) -> Result<Vec<(Planning, VoteLedger)>, PersistError>;
}
