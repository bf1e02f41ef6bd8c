//! In-memory pub/sub for invalidation messages.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use account_core::cache::{InvalidationMessage, Result, Subscription};

/// Buffered messages per subscription before publishers wait.
const CHANNEL_CAPACITY: usize = 256;

/// Topic-keyed fan-out over tokio mpsc channels.
#[derive(Debug, Clone, Default)]
pub struct MemoryPubSub {
    subscribers: Arc<RwLock<HashMap<String, Vec<mpsc::Sender<InvalidationMessage>>>>>,
}

impl MemoryPubSub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `message` to every live subscriber of `topic`.
    pub async fn publish(&self, topic: &str, message: &InvalidationMessage) -> Result<()> {
        let senders = {
            let mut subscribers = self.subscribers.write().await;
            let Some(senders) = subscribers.get_mut(topic) else {
                return Ok(());
            };
            senders.retain(|sender| !sender.is_closed());
            senders.clone()
        };

        for sender in senders {
            // A subscriber dropping between the prune and the send is harmless.
            let _ = sender.send(message.clone()).await;
        }
        Ok(())
    }

    pub async fn subscribe(&self, topic: &str) -> Result<Subscription> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        self.subscribers
            .write()
            .await
            .entry(topic.to_string())
            .or_default()
            .push(tx);
        Ok(rx)
    }

    /// Drops every sender so all subscriptions end.
    pub async fn disconnect_all(&self) {
        self.subscribers.write().await.clear();
    }

    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.subscribers
            .read()
            .await
            .get(topic)
            .map(|senders| senders.iter().filter(|s| !s.is_closed()).count())
            .unwrap_or(0)
    }
}
