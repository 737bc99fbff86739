//! PlanDaemon - group decision engine
//!
//! PlanDaemon lets a group of participants settle a small set of proposed
//! options (time slots, places, tasks) by casting open votes, with a live
//! tally until the organizer closes the decision.
//!
//! # Core Concepts
//!
//! - **One slot per planning**: mutations on a planning are serialized by
//!   its mutation slot; different plannings never block each other
//! - **Durable before visible**: a vote is written to storage before it
//!   appears in any snapshot; a failed write rolls the mutation back
//! - **Immutable snapshots**: the tally handed to a transport is a frozen
//!   copy, untouched by later votes
//!
//! # Modules
//!
//! - [`domain`] - Planning, options, voters, vote ledger, snapshots
//! - [`engine`] - registry, lifecycle and concurrency control
//! - [`persist`] - the storage interface and its SQLite/in-memory backends
//! - [`transport`] - the conversation boundary (console and channel glue)
//! - [`session`] - binds an engine to a transport
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod daemon;
pub mod domain;
pub mod engine;
pub mod persist;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use config::{Config, StorageConfig, TransportConfig};
pub use domain::{
    IdMatch, OptionTally, PlanOption, Planning, PlanningStatus, PlanningSummary, Snapshot, VoteDelta, VoteLedger,
    Voter, generate_id, resolve,
};
pub use engine::{EngineConfig, EngineError, EngineResult, PlanningEngine};
pub use persist::{MemoryStore, PersistError, PlanningStore, SqliteStore};
pub use session::{Session, dispatch};
pub use transport::{
    ChannelProbe, ChannelTransport, ChatTransport, ConsoleTransport, EngineReply, InboundAction,
};
