//! Redis pub/sub subscription forwarding.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;

use account_core::cache::{InvalidationMessage, Result, Subscription};

use super::error::{bounded, map_redis_error};

/// Buffered messages per subscription before the forwarder waits.
const CHANNEL_CAPACITY: usize = 256;

/// Opens a dedicated pub/sub connection subscribed to `topic`.
///
/// A background task forwards decoded messages into the returned
/// subscription. It exits, unsubscribing and closing the connection, when
/// the subscription is dropped; the subscription ends when the connection
/// is lost.
pub(super) async fn subscribe(
    client: &redis::Client,
    topic: &str,
    op_timeout: Duration,
) -> Result<Subscription> {
    let mut pubsub = bounded(op_timeout, client.get_async_pubsub()).await?;
    bounded(op_timeout, pubsub.subscribe(topic)).await?;

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    tokio::spawn(run_subscription_loop(pubsub, topic.to_string(), tx));

    tracing::debug!(%topic, "Subscribed to invalidation topic");
    Ok(rx)
}

/// Forwards Redis messages to the subscription until either side goes away.
async fn run_subscription_loop(
    mut pubsub: redis::aio::PubSub,
    topic: String,
    tx: mpsc::Sender<InvalidationMessage>,
) {
    let mut stream = pubsub.on_message();

    loop {
        tokio::select! {
            _ = tx.closed() => {
                tracing::debug!(%topic, "Invalidation subscription dropped");
                break;
            }
            msg = stream.next() => {
                let Some(msg) = msg else {
                    tracing::warn!(%topic, "Redis subscription stream ended");
                    break;
                };

                let payload: String = match msg.get_payload() {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::warn!(%topic, error = %map_redis_error(e), "Unreadable invalidation payload");
                        continue;
                    }
                };

                match InvalidationMessage::decode(&payload) {
                    Ok(message) => {
                        if tx.send(message).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(%topic, error = %e, %payload, "Malformed invalidation message");
                    }
                }
            }
        }
    }

    drop(stream);
    // Best effort: the connection is dropped right after either way.
    let _ = pubsub.unsubscribe(&topic).await;
}
