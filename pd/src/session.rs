//! Session - binds an engine to a transport
//!
//! One logical task per inbound action: actions against different plannings
//! run fully in parallel, actions against the same planning queue on its
//! mutation slot. Replies go back through the transport from whichever task
//! finished.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::PlanningEngine;
use crate::transport::{ChatTransport, EngineReply, InboundAction};

/// Dispatch loop for one conversation
pub struct Session {
    engine: PlanningEngine,
}

impl Session {
    pub fn new(engine: PlanningEngine) -> Self {
        Self { engine }
    }

    /// Run until the transport ends the conversation or shutdown is
    /// signalled. In-flight actions finish delivering on their own tasks.
    pub async fn run<T: ChatTransport + 'static>(self, transport: Arc<T>, mut shutdown: mpsc::Receiver<()>) {
        info!("session started");
        loop {
            tokio::select! {
                action = transport.next_action() => {
                    let Some(action) = action else {
                        info!("transport ended the conversation");
                        break;
                    };
                    debug!(?action, "action received");
                    let engine = self.engine.clone();
                    let transport = transport.clone();
                    tokio::spawn(async move {
                        let reply = dispatch(&engine, action).await;
                        transport.deliver(reply).await;
                    });
                }
                _ = shutdown.recv() => {
                    info!("session shutting down");
                    break;
                }
            }
        }
    }
}

/// Apply one action to the engine and shape the reply.
pub async fn dispatch(engine: &PlanningEngine, action: InboundAction) -> EngineReply {
    let result = match action {
        InboundAction::Create {
            scope,
            title,
            creator,
            options,
            single_select,
        } => engine
            .create(&scope, &title, creator, options, single_select)
            .await
            .map(|snapshot| EngineReply::Snapshot { snapshot, delta: None }),

        InboundAction::Toggle {
            planning_id,
            option_id,
            voter,
        } => engine.toggle(&planning_id, option_id, &voter).await.map(|(delta, snapshot)| {
            EngineReply::Snapshot {
                snapshot,
                delta: Some(delta),
            }
        }),

        InboundAction::Close {
            planning_id,
            requester_id,
        } => engine
            .close(&planning_id, &requester_id)
            .await
            .map(|snapshot| EngineReply::Snapshot { snapshot, delta: None }),

        InboundAction::List { scope } => engine.list(&scope).await.map(EngineReply::Summaries),

        InboundAction::Show { planning_id } => engine
            .snapshot(&planning_id)
            .await
            .map(|snapshot| EngineReply::Snapshot { snapshot, delta: None }),
    };

    result.unwrap_or_else(EngineReply::Rejected)
}
