//! OrderCore main server: order intake, the state machine, and multi-channel
//! notification dispatch (spec.md §9's "one-shot constructor graph").
//!
//! The chat-platform and messaging-platform SDKs and the geolocation estimator
//! are out of scope (spec.md §1/§6); this binary wires in logging stand-ins so
//! the dependency graph is still exercised end to end locally.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mongodb::Client as MongoClient;
use rc_channels::{
    CardAdapter, CardEmbed, CardMessenger, CardReplier, CardUpdater, ChatPlatformClient,
    MessagingPlatformClient, MsgAdapter, MsgUpdater, SseBroadcaster, SseHub,
};
use rc_config::AppConfig;
use rc_dispatch::{ChannelDispatchHandler, ChannelHandlers, DispatchCore, NotificationPool};
use rc_ingress::{DriverActions, OrderIntake, SlashCommands};
use rc_order::{DistanceEstimator, DriverRepository, NotificationSink, OrderRepository, OrderStateMachine, ShortIdGenerator};
use tokio::sync::Notify;
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

/// No messaging-platform SDK wired up for local runs.
struct LoggingMessagingClient;

#[async_trait]
impl MessagingPlatformClient for LoggingMessagingClient {
    async fn edit_message(&self, message_id: &str, text: &str) -> rc_common::Result<()> {
        info!(message_id, text, "DEV: would edit message");
        Ok(())
    }
}

/// Geolocation/routing is an out-of-scope collaborator (spec.md §1): this stand-in
/// reports zero distance rather than guessing at a real estimate.
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
    rc_common::logging::init_logging("rc-server");
    info!("starting OrderCore server");

    let config = AppConfig::load()?;

    let mongo_client = MongoClient::with_uri_str(&config.mongodb.uri).await?;
    let db = mongo_client.database(&config.mongodb.database);
    info!(database = %config.mongodb.database, "connected to MongoDB");

    let bus = Arc::new(
        rc_bus::EventBus::connect(&config.redis.url, Duration::from_millis(config.bus.reconnect_backoff_ms)).await?,
    );
    info!(url = %config.redis.url, "connected to event bus");

    let orders = Arc::new(OrderRepository::new(&db));
    let drivers = Arc::new(DriverRepository::new(&db));
    let short_ids = Arc::new(ShortIdGenerator::new(&db));

    let chat_client: Arc<dyn ChatPlatformClient> = Arc::new(LoggingChatClient);
    let msg_client: Arc<dyn MessagingPlatformClient> = Arc::new(LoggingMessagingClient);
    let distance: Arc<dyn DistanceEstimator> = Arc::new(UnknownDistanceEstimator);

    let card_adapter = Arc::new(CardAdapter::new(chat_client, bus.clone()));
    let msg_adapter = Arc::new(MsgAdapter::new(msg_client, bus.clone()));
    let sse_hub = Arc::new(SseHub::new(SSE_HUB_CAPACITY));

    let dispatch_handler = ChannelDispatchHandler::new(
        card_adapter.clone() as Arc<dyn CardUpdater>,
        card_adapter.clone() as Arc<dyn CardReplier>,
        card_adapter.clone() as Arc<dyn CardMessenger>,
        msg_adapter.clone() as Arc<dyn MsgUpdater>,
        sse_hub.clone() as Arc<dyn SseBroadcaster>,
    );

    let pool = NotificationPool::new(config.dispatch.workers, config.dispatch.queue_size, dispatch_handler);
    pool.start();

    let dispatch_core: Arc<dyn NotificationSink> = Arc::new(DispatchCore::new(pool.clone()));

    let state_machine = Arc::new(OrderStateMachine::new(
        orders.clone(),
        drivers.clone(),
        bus.clone(),
        dispatch_core,
        distance,
    ));

    let shutdown = Arc::new(Notify::new());

    let channel_handlers = ChannelHandlers::new(
        orders.clone(),
        card_adapter as Arc<dyn CardUpdater>,
        msg_adapter as Arc<dyn MsgUpdater>,
    );
    channel_handlers.subscribe(&bus, shutdown.clone());

    let intake = Arc::new(OrderIntake::new(orders.clone(), short_ids, state_machine.clone()));
    let _driver_actions = Arc::new(DriverActions::new(state_machine.clone()));
    let _slash_commands = Arc::new(SlashCommands::new(orders, drivers, state_machine, intake));

    info!("OrderCore server ready");
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received, draining notification pool");

    shutdown.notify_waiters();
    pool.stop(Duration::from_secs(config.dispatch.shutdown_drain_secs)).await;

    info!("OrderCore server stopped");
    Ok(())
}
