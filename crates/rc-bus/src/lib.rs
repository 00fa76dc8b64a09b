//! Redis-backed event fan-out bus (C1).
//!
//! Three logical topics carry `OrderStatusEvent`/`UiUpdateEvent` JSON payloads
//! (spec.md §4.1, §6). Publish goes through a shared `ConnectionManager`; each
//! subscription owns its own `PubSub` connection and is supervised independently
//! so one dropped subscription never affects another.

pub mod dedup;
mod error;

pub use error::{EventBusError, Result};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use rc_common::{OrderStatusEvent, UiUpdateEvent};
use redis::aio::ConnectionManager;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

/// Topic names, pinned to the wire contract (spec.md §6) — not configurable.
pub const TOPIC_ORDER_STATUS: &str = "order.status";
pub const TOPIC_CARD_UPDATE: &str = "ui.card.update";
pub const TOPIC_MSG_UPDATE: &str = "ui.msg.update";

pub struct EventBus {
    client: redis::Client,
    conn: ConnectionManager,
    reconnect_backoff: Duration,
}

impl EventBus {
    pub async fn connect(redis_url: &str, reconnect_backoff: Duration) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| EventBusError::Connection(e.to_string()))?;
        let conn = ConnectionManager::new(client.clone()).await?;
        Ok(Self {
            client,
            conn,
            reconnect_backoff,
        })
    }

    async fn publish_json<T: serde::Serialize>(&self, topic: &str, payload: &T) -> Result<()> {
        let body = serde_json::to_string(payload)?;
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("PUBLISH")
            .arg(topic)
            .arg(body)
            .query_async(&mut conn)
            .await?;
        metrics::counter!("bus.published_total").increment(1);
        Ok(())
    }

    pub async fn publish_order_status(&self, event: &OrderStatusEvent) -> Result<()> {
        self.publish_json(TOPIC_ORDER_STATUS, event).await
    }

    pub async fn publish_card_update(&self, event: &UiUpdateEvent) -> Result<()> {
        self.publish_json(TOPIC_CARD_UPDATE, event).await
    }

    pub async fn publish_msg_update(&self, event: &UiUpdateEvent) -> Result<()> {
        self.publish_json(TOPIC_MSG_UPDATE, event).await
    }

    /// Mark a chat-platform inbound message id as seen. Returns `false` if it was
    /// already processed within the TTL window (spec.md §4.4 dedup rule).
    pub async fn try_mark_processed(&self, message_id: &str, ttl_secs: u64) -> Result<bool> {
        let key = format!("discord_msg_processed:{message_id}");
        let mut conn = self.conn.clone();
        dedup::try_mark_processed(&mut conn, &key, ttl_secs).await
    }

    /// Subscribe to `topic`, invoking `handler` with each raw JSON payload.
    ///
    /// Runs until `shutdown` is notified. A dropped connection reconnects after
    /// `reconnect_backoff` (≥ 1s per spec.md §4.1); a panic inside `handler`
    /// restarts the subscription after 5s, losing the message that caused it
    /// (spec.md §4.1/§7 `ErrPanic`).
    pub fn subscribe<F, Fut>(
        self: &Arc<Self>,
        topic: &str,
        handler: F,
        shutdown: Arc<Notify>,
    ) -> tokio::task::JoinHandle<()>
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let bus = self.clone();
        let topic = topic.to_string();
        let handler = Arc::new(handler);

        tokio::spawn(async move {
            let backoff = bus.reconnect_backoff;

            loop {
                let bus_task = bus.clone();
                let handler = handler.clone();
                let topic = topic.clone();

                let run =
                    tokio::spawn(async move { bus_task.run_subscription(&topic, handler).await });

                tokio::select! {
                    result = run => {
                        match result {
                            Ok(Ok(())) => unreachable!("run_subscription only returns on error"),
                            Ok(Err(e)) => {
                                warn!(error = %e, backoff_ms = backoff.as_millis() as u64, "subscription dropped, reconnecting");
                                metrics::counter!("bus.reconnects_total").increment(1);
                                tokio::time::sleep(backoff).await;
                            }
                            Err(join_err) => {
                                error!(panic = %join_err, "subscriber panicked, restarting in 5s");
                                metrics::counter!("bus.reconnects_total").increment(1);
                                tokio::time::sleep(Duration::from_secs(5)).await;
                            }
                        }
                    }
                    _ = shutdown.notified() => {
                        info!("subscription shutting down");
                        break;
                    }
                }
            }
        })
    }

    async fn run_subscription<F, Fut>(&self, topic: &str, handler: Arc<F>) -> Result<()>
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(topic).await?;
        info!(topic, "subscribed");

        let mut stream = pubsub.on_message();
        while let Some(msg) = stream.next().await {
            let payload: String = msg.get_payload()?;
            debug!(topic, bytes = payload.len(), "received message");
            metrics::counter!("bus.received_total").increment(1);
            (handler)(payload).await;
        }

        Err(EventBusError::Connection(format!(
            "subscription stream for {topic} ended"
        )))
    }
}
