//! Domain types for PlanDaemon
//!
//! Core domain types: Planning, PlanOption, Voter, VoteLedger, Snapshot.
//! The ledger holds the votes; plannings hold the fixed option set and the
//! lifecycle state; snapshots are immutable views over both.

mod id;
mod ledger;
mod planning;
mod snapshot;
mod voter;

pub use id::{IdMatch, generate_id, resolve};
pub use ledger::{VoteDelta, VoteLedger};
pub use planning::{PlanOption, Planning, PlanningStatus, PlanningSummary};
pub use snapshot::{OptionTally, Snapshot};
pub use voter::Voter;
