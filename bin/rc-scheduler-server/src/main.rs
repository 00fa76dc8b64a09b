//! Scheduled-order activation scanner server (C7): wires the same state
//! machine/dispatch graph as rc-server, but drives it only from the
//! activation scheduler's poll loop rather than from inbound ingress.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mongodb::Client as MongoClient;
use rc_channels::{
    CardAdapter, CardEmbed, CardMessenger, CardReplier, CardUpdater, ChatPlatformClient,
    MessagingPlatformClient, MsgAdapter, MsgUpdater, SseBroadcaster, SseHub,
};
use rc_config::AppConfig;
use rc_dispatch::{ChannelDispatchHandler, DispatchCore, NotificationPool};
use rc_order::{DistanceEstimator, DriverRepository, NotificationSink, OrderRepository, OrderStateMachine};
use rc_scheduler::{ActivationScheduler, SchedulerConfig};
use tracing::{info, warn};

/// No chat-platform SDK wired up for local runs; logs what would have been sent.
struct LoggingChatClient;

#[async_trait]
impl ChatPlatformClient for LoggingChatClient {
    async fn edit_card(&self, channel_id: &str, message_id: &str, embed: CardEmbed) -> rc_common::Result<()> {
        info!(channel_id, message_id, title = %embed.title, "DEV: would edit card");
        Ok(())
    }

    async fn send_banner_reply(&self, channel_id: &str, message_id: &str, text: &str, color: u32) -> rc_common::Result<()> {
        info!(channel_id, message_id, color, text, "DEV: would send banner reply");
        Ok(())
    }

    async fn send_message(&self, channel_id: &str, text: &str) -> rc_common::Result<String> {
        info!(channel_id, text, "DEV: would send conversion message");
        Ok(format!("dev-msg-{}", uuid::Uuid::new_v4()))
    }
}

struct LoggingMessagingClient;

#[async_trait]
impl MessagingPlatformClient for LoggingMessagingClient {
    async fn edit_message(&self, message_id: &str, text: &str) -> rc_common::Result<()> {
        info!(message_id, text, "DEV: would edit message");
        Ok(())
    }
}

struct UnknownDistanceEstimator;

#[async_trait]
impl DistanceEstimator for UnknownDistanceEstimator {
    async fn calc_distance_and_mins(&self, driver: &rc_common::Driver, _order: &rc_common::Order) -> (f64, i64) {
        warn!(driver_id = %driver.driver_id, "DEV: no distance estimator wired, reporting zero");
        (0.0, 0)
    }
}

const SSE_HUB_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rc_common::logging::init_logging("rc-scheduler-server");
    info!("starting activation scheduler server");

    let config = AppConfig::load()?;
    info!(
        enabled = config.scheduler.enabled,
        poll_interval_ms = config.scheduler.poll_interval_ms,
        "scheduler configuration loaded"
    );

    let mongo_client = MongoClient::with_uri_str(&config.mongodb.uri).await?;
    let db = mongo_client.database(&config.mongodb.database);
    info!(database = %config.mongodb.database, "connected to MongoDB");

    let bus = Arc::new(
        rc_bus::EventBus::connect(&config.redis.url, Duration::from_millis(config.bus.reconnect_backoff_ms)).await?,
    );

    let orders = Arc::new(OrderRepository::new(&db));
    let drivers = Arc::new(DriverRepository::new(&db));

    let chat_client: Arc<dyn ChatPlatformClient> = Arc::new(LoggingChatClient);
    let msg_client: Arc<dyn MessagingPlatformClient> = Arc::new(LoggingMessagingClient);
    let distance: Arc<dyn DistanceEstimator> = Arc::new(UnknownDistanceEstimator);

    let card_adapter = Arc::new(CardAdapter::new(chat_client, bus.clone()));
    let msg_adapter = Arc::new(MsgAdapter::new(msg_client, bus.clone()));
    let sse_hub = Arc::new(SseHub::new(SSE_HUB_CAPACITY));

    let dispatch_handler = ChannelDispatchHandler::new(
        card_adapter.clone() as Arc<dyn CardUpdater>,
        card_adapter.clone() as Arc<dyn CardReplier>,
        card_adapter as Arc<dyn CardMessenger>,
        msg_adapter as Arc<dyn MsgUpdater>,
        sse_hub as Arc<dyn SseBroadcaster>,
    );

    let pool = NotificationPool::new(config.dispatch.workers, config.dispatch.queue_size, dispatch_handler);
    pool.start();

    let dispatch_core: Arc<dyn NotificationSink> = Arc::new(DispatchCore::new(pool.clone()));

    let state_machine = Arc::new(OrderStateMachine::new(orders.clone(), drivers, bus, dispatch_core, distance));

    let scheduler_config = SchedulerConfig {
        enabled: config.scheduler.enabled,
        poll_interval: Duration::from_millis(config.scheduler.poll_interval_ms),
        activation_window: Duration::from_secs(config.scheduler.activation_window_mins as u64 * 60),
    };

    let scheduler = ActivationScheduler::new(scheduler_config, orders, state_machine);
    scheduler.start();

    info!("activation scheduler server ready");
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    scheduler.stop();
    pool.stop(Duration::from_secs(config.dispatch.shutdown_drain_secs)).await;

    info!("activation scheduler server stopped");
    Ok(())
}
