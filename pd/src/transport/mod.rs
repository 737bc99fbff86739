//! Transport boundary
//!
//! The engine knows nothing about any chat network. A transport feeds it
//! [`InboundAction`]s - with planning, option and voter already resolved -
//! and receives [`EngineReply`]s to render however its protocol likes.
//!
//! Two implementations ship with the daemon, both glue: a channel loopback
//! used by the session tests and an interactive console front end.

mod channel;
mod console;

pub use channel::{ChannelProbe, ChannelTransport};
pub use console::{ConsoleCommand, ConsoleTransport, parse_command};

use async_trait::async_trait;

use crate::domain::{PlanningSummary, Snapshot, VoteDelta, Voter};
use crate::engine::EngineError;

/// An action a participant performed, as the transport resolved it
#[derive(Debug, Clone)]
pub enum InboundAction {
    Create {
        scope: String,
        title: String,
        creator: Voter,
        options: Vec<String>,
        single_select: bool,
    },
    Toggle {
        planning_id: String,
        option_id: u32,
        voter: Voter,
    },
    Close {
        planning_id: String,
        requester_id: String,
    },
    List {
        scope: String,
    },
    Show {
        planning_id: String,
    },
}

/// What the engine hands back for rendering
#[derive(Debug, Clone)]
pub enum EngineReply {
    /// Fresh tally after a successful create/toggle/close/show
    Snapshot {
        snapshot: Snapshot,
        /// Set when the action was a toggle
        delta: Option<VoteDelta>,
    },
    /// Result of a list request
    Summaries(Vec<PlanningSummary>),
    /// The action was rejected; state is unchanged
    Rejected(EngineError),
}

/// A conversation the engine is bound to.
///
/// Both methods take `&self`: replies are delivered from concurrently
/// running per-action tasks, so implementations synchronize internally.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Next participant action; `None` when the conversation ended.
    async fn next_action(&self) -> Option<InboundAction>;

    /// Deliver a rendered reply to the conversation.
    async fn deliver(&self, reply: EngineReply);
}
