//! Background task that applies invalidation messages to the local cache.
//!
//! One cleaner runs per process. It keeps a subscription to the invalidation
//! topic open for the life of the process and evicts every announced key
//! from the local tier. When the subscription is lost it resubscribes after
//! a delay and then clears the local tier, because anything published while
//! disconnected was never delivered.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use account_core::cache::{CachePubSub, InvalidationMessage, LocalCache, INVALIDATION_TOPIC};

/// Subscribes to invalidations and evicts the named keys locally.
pub struct LocalCacheCleaner<L, P> {
    local: Arc<L>,
    pubsub: Arc<P>,
    topic: String,
    retry_delay: Duration,
}

impl<L, P> LocalCacheCleaner<L, P>
where
    L: LocalCache + 'static,
    P: CachePubSub + 'static,
{
    /// Creates a cleaner for the account invalidation topic.
    pub fn new(local: Arc<L>, pubsub: Arc<P>, retry_delay: Duration) -> Self {
        Self {
            local,
            pubsub,
            topic: INVALIDATION_TOPIC.to_string(),
            retry_delay,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    /// Runs the cleaner on a background task.
    pub fn spawn(self) -> CleanerHandle {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(self.run(shutdown_rx));
        CleanerHandle { shutdown_tx, task }
    }

    /// Subscribe/resubscribe loop. Returns once `shutdown` fires or its
    /// sender is dropped.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let topic = self.topic.as_str();
        let mut lost = false;

        loop {
            let subscribed = tokio::select! {
                _ = shutdown.recv() => break,
                result = self.pubsub.subscribe(topic) => result,
            };

            match subscribed {
                Ok(mut subscription) => {
                    if lost {
                        tracing::info!(%topic, "Invalidation subscription re-established, clearing local cache");
                        if let Err(e) = self.local.clear().await {
                            tracing::error!(%topic, error = %e, "Failed to clear local cache");
                        }
                    } else {
                        tracing::info!(%topic, "Local cache cleaner subscribed");
                    }

                    let stopped = loop {
                        tokio::select! {
                            _ = shutdown.recv() => break true,
                            message = subscription.recv() => match message {
                                Some(message) => self.evict(&message).await,
                                None => break false,
                            },
                        }
                    };

                    // Dropping the subscription unsubscribes.
                    drop(subscription);
                    if stopped {
                        break;
                    }
                    tracing::warn!(%topic, "Invalidation subscription lost");
                }
                Err(e) => {
                    tracing::error!(%topic, error = %e, "Failed to subscribe to invalidations");
                }
            }

            lost = true;
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = tokio::time::sleep(self.retry_delay) => {}
            }
        }

        tracing::info!(%topic, "Local cache cleaner stopped");
    }

    async fn evict(&self, message: &InvalidationMessage) {
        for key in message.keys() {
            match self.local.delete(key).await {
                Ok(()) => tracing::trace!(%key, "Evicted from local cache"),
                Err(e) => tracing::warn!(%key, error = %e, "Failed to evict from local cache"),
            }
        }
    }
}

/// Handle to a spawned cleaner.
pub struct CleanerHandle {
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl CleanerHandle {
    /// Signals the cleaner and waits for it to drop its subscription.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Local cache cleaner task failed");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
