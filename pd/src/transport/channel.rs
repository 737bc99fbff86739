//! Channel loopback transport
//!
//! Actions in, replies out, over mpsc channels. The session tests drive the
//! engine through this; it is also a convenient seam for embedding the
//! engine in another process.

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use super::{ChatTransport, EngineReply, InboundAction};

pub struct ChannelTransport {
    actions: Mutex<mpsc::Receiver<InboundAction>>,
    replies: mpsc::Sender<EngineReply>,
}

/// The far end of a [`ChannelTransport`]: inject actions, read replies.
pub struct ChannelProbe {
    actions: mpsc::Sender<InboundAction>,
    replies: mpsc::Receiver<EngineReply>,
}

impl ChannelTransport {
    /// Create a connected transport/probe pair.
    pub fn pair(buffer: usize) -> (Self, ChannelProbe) {
        let (action_tx, action_rx) = mpsc::channel(buffer);
        let (reply_tx, reply_rx) = mpsc::channel(buffer);
        (
            Self {
                actions: Mutex::new(action_rx),
                replies: reply_tx,
            },
            ChannelProbe {
                actions: action_tx,
                replies: reply_rx,
            },
        )
    }
}

#[async_trait]
impl ChatTransport for ChannelTransport {
    async fn next_action(&self) -> Option<InboundAction> {
        self.actions.lock().await.recv().await
    }

    async fn deliver(&self, reply: EngineReply) {
        let _ = self.replies.send(reply).await;
    }
}

impl ChannelProbe {
    /// Inject an action as if a participant performed it. Returns false if
    /// the session is gone.
    pub async fn send(&self, action: InboundAction) -> bool {
        self.actions.send(action).await.is_ok()
    }

    /// Next reply from the engine; `None` once the session ended.
    pub async fn recv(&mut self) -> Option<EngineReply> {
        self.replies.recv().await
    }

    /// Dropping the sender ends the conversation from the transport side.
    pub fn hang_up(self) {}
}
