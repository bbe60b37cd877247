use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use yaca_types::events::{ChatEvent, GatewayEvent};

/// A live gateway connection.
struct Subscriber {
    /// Verified username, `None` for anonymous connections
    username: Option<String>,
    tx: mpsc::UnboundedSender<GatewayEvent>,
}

/// Tracks connected subscribers and fans events out to them.
///
/// Delivery is best effort: an event reaches the subscribers connected at the
/// moment it is broadcast and nobody else. There is no replay.
#[derive(Clone, Default)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

#[derive(Default)]
struct DispatcherInner {
    /// conn_id -> subscriber
    subscribers: RwLock<HashMap<Uuid, Subscriber>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. Returns (conn_id, receiver).
    pub async fn connect(
        &self,
        username: Option<String>,
    ) -> (Uuid, mpsc::UnboundedReceiver<GatewayEvent>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .subscribers
            .write()
            .await
            .insert(conn_id, Subscriber { username, tx });
        (conn_id, rx)
    }

    pub async fn disconnect(&self, conn_id: Uuid) {
        self.inner.subscribers.write().await.remove(&conn_id);
    }

    /// Send an event to every connected subscriber. Returns how many received
    /// it. Subscribers whose receiver is gone are dropped.
    pub async fn broadcast(&self, event: GatewayEvent) -> usize {
        let mut subscribers = self.inner.subscribers.write().await;
        let mut delivered = 0;
        subscribers.retain(|conn_id, sub| {
            if sub.tx.send(event.clone()).is_ok() {
                delivered += 1;
                true
            } else {
                debug!(
                    "Dropping closed subscriber {} ({})",
                    conn_id,
                    sub.username.as_deref().unwrap_or("anonymous")
                );
                false
            }
        });
        delivered
    }

    pub async fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().await.len()
    }

    /// Relay chat events from the event bus to subscribers until the bus
    /// closes.
    pub fn listen(&self, mut events: broadcast::Receiver<ChatEvent>) -> JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Event relay lagged by {} events", n);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };

                match event {
                    ChatEvent::MessageCreated(message) => {
                        let id = message.id;
                        let delivered = dispatcher
                            .broadcast(GatewayEvent::NewChatMessage(message))
                            .await;
                        debug!("Message {} pushed to {} subscribers", id, delivered);
                    }
                }
            }
            info!("Event bus closed, relay stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yaca_types::events::EventBus;
    use yaca_types::models::ChatMessage;

    fn message(text: &str) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            author: "ann@x.com".into(),
            text: text.into(),
            display_name: "Ann".into(),
            timestamp: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_every_connected_subscriber() {
        let dispatcher = Dispatcher::new();
        let (_, mut a) = dispatcher.connect(Some("ann@x.com".into())).await;
        let (_, mut b) = dispatcher.connect(None).await;

        let event = GatewayEvent::NewChatMessage(message("hi"));
        assert_eq!(dispatcher.broadcast(event.clone()).await, 2);
        assert_eq!(a.recv().await.unwrap(), event);
        assert_eq!(b.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn late_subscriber_gets_no_replay() {
        let dispatcher = Dispatcher::new();
        dispatcher
            .broadcast(GatewayEvent::NewChatMessage(message("early")))
            .await;

        let (_, mut rx) = dispatcher.connect(None).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn disconnected_and_dropped_subscribers_are_removed() {
        let dispatcher = Dispatcher::new();
        let (gone, _rx_gone) = dispatcher.connect(None).await;
        let (_, dropped) = dispatcher.connect(None).await;
        let (_, _kept) = dispatcher.connect(Some("ann@x.com".into())).await;

        dispatcher.disconnect(gone).await;
        drop(dropped);

        let delivered = dispatcher
            .broadcast(GatewayEvent::NewChatMessage(message("hi")))
            .await;
        assert_eq!(delivered, 1);
        assert_eq!(dispatcher.subscriber_count().await, 1);
    }

    #[tokio::test]
    async fn listen_relays_created_messages() {
        let bus = EventBus::new(16);
        let dispatcher = Dispatcher::new();
        let (_, mut rx) = dispatcher.connect(None).await;
        let relay = dispatcher.listen(bus.subscribe());

        let created = message("relayed");
        bus.publish(ChatEvent::MessageCreated(created.clone()));

        let pushed = tokio::time::timeout(std::time::Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pushed, GatewayEvent::NewChatMessage(created));

        drop(bus);
        tokio::time::timeout(std::time::Duration::from_secs(2), relay)
            .await
            .unwrap()
            .unwrap();
    }
}
