use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

use crate::models::ChatMessage;

/// Domain events raised by the services after a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    MessageCreated(ChatMessage),
}

/// In-process publish/subscribe channel for [`ChatEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ChatEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. Having no listener is not an error.
    pub fn publish(&self, event: ChatEvent) {
        if self.tx.send(event).is_err() {
            trace!("Event published with no listeners");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// Events sent over the WebSocket gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum GatewayEvent {
    /// First frame on every connection
    Ready {
        connection_id: Uuid,
        username: Option<String>,
    },

    /// A chat message was persisted
    NewChatMessage(ChatMessage),
}
