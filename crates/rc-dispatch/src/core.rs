//! C5: implements C3's `NotificationSink` by reading the order exactly once
//! (already done by the caller) and fanning a snapshot out into one
//! `NotificationTask` per applicable channel (spec.md §4.3/§4.4).

use std::sync::Arc;

use async_trait::async_trait;
use rc_channels::{CardMessenger, CardReplier, CardUpdater, MsgUpdater, SseBroadcaster, SsePage};
use rc_common::{DispatchPolicy, Driver, NotifyChannel, NotifyEvent, Order, OrderId};
use rc_order::NotificationSink;
use tracing::warn;

use crate::pool::{NotificationPool, TaskHandler};

/// Card/Msg deliveries are lifecycle-critical and block the caller on a full
/// queue; Sse is best-effort UI refresh and is dropped with a warning
/// (spec.md §4.4 — the only entry points named non-critical, `DriverRejected`
/// and `DriverTimeout`, target only Sse).
fn policy_for(channel: NotifyChannel) -> DispatchPolicy {
    match channel {
        NotifyChannel::Card | NotifyChannel::Msg => DispatchPolicy::Block,
        NotifyChannel::Sse => DispatchPolicy::Drop,
    }
}

/// Which channels carry each event (spec.md §4.3's table).
fn channels_for(event: NotifyEvent) -> &'static [NotifyChannel] {
    use NotifyChannel::*;
    match event {
        NotifyEvent::DriverAccepted => &[Card, Msg, Sse],
        NotifyEvent::ScheduledAccepted => &[Card, Msg],
        NotifyEvent::ScheduledActivated => &[Card, Msg, Sse],
        NotifyEvent::DriverArrived => &[Card, Msg, Sse],
        NotifyEvent::CustomerOnBoard => &[Card, Msg, Sse],
        NotifyEvent::OrderCompleted => &[Card, Msg, Sse],
        NotifyEvent::OrderCancelled => &[Card, Msg],
        NotifyEvent::OrderFailed => &[Card, Msg, Sse],
        NotifyEvent::DriverRejected => &[Sse],
        NotifyEvent::DriverTimeout => &[Sse],
        NotifyEvent::ConversionMessage => &[Card, Msg],
        NotifyEvent::ScheduledWaiting => &[Card, Msg],
        NotifyEvent::OrderConverted => &[Card, Msg],
    }
}

pub struct DispatchCore {
    pool: Arc<NotificationPool>,
}

impl DispatchCore {
    pub fn new(pool: Arc<NotificationPool>) -> Self {
        Self { pool }
    }

    async fn fan_out(
        &self,
        order_id: &OrderId,
        order: Option<&Order>,
        driver: Option<&Driver>,
        event: NotifyEvent,
        distance_km: Option<f64>,
        estimated_mins: Option<i64>,
    ) {
        for &channel in channels_for(event) {
            let task = rc_common::NotificationTask {
                channel,
                order_id: order_id.clone(),
                order: order.cloned(),
                driver: driver.cloned(),
                event,
                distance_km,
                estimated_mins,
                policy: policy_for(channel),
            };
            self.pool.enqueue(task).await;
        }
    }
}

#[async_trait]
impl NotificationSink for DispatchCore {
    async fn notify_order_accepted(&self, order: &Order, driver: &Driver, distance_km: f64, estimated_mins: i64) {
        self.fan_out(&order.order_id, Some(order), Some(driver), NotifyEvent::DriverAccepted, Some(distance_km), Some(estimated_mins)).await;
    }

    async fn notify_scheduled_order_accepted(&self, order: &Order, driver: &Driver) {
        self.fan_out(&order.order_id, Some(order), Some(driver), NotifyEvent::ScheduledAccepted, None, None).await;
    }

    async fn notify_scheduled_order_activated(&self, order: &Order, driver: &Driver, distance_km: f64, estimated_mins: i64) {
        self.fan_out(&order.order_id, Some(order), Some(driver), NotifyEvent::ScheduledActivated, Some(distance_km), Some(estimated_mins)).await;
    }

    async fn notify_scheduled_order_waiting(&self, order: &Order) {
        self.fan_out(&order.order_id, Some(order), None, NotifyEvent::ScheduledWaiting, None, None).await;
    }

    async fn notify_order_converted(&self, order: &Order) {
        self.fan_out(&order.order_id, Some(order), None, NotifyEvent::OrderConverted, None, None).await;
    }

    async fn notify_order_conversion_message(&self, order: &Order) {
        self.fan_out(&order.order_id, Some(order), None, NotifyEvent::ConversionMessage, None, None).await;
    }

    async fn notify_driver_arrived(&self, order: &Order, driver: &Driver, _photo_taken: bool) {
        self.fan_out(&order.order_id, Some(order), Some(driver), NotifyEvent::DriverArrived, order.driver.est_pickup_dist_km, order.driver.est_pickup_mins).await;
    }

    async fn notify_customer_on_board(&self, order: &Order, driver: &Driver) {
        self.fan_out(&order.order_id, Some(order), Some(driver), NotifyEvent::CustomerOnBoard, order.driver.est_pickup_dist_km, order.driver.est_pickup_mins).await;
    }

    async fn notify_order_completed(&self, order: &Order, driver: &Driver) {
        self.fan_out(&order.order_id, Some(order), Some(driver), NotifyEvent::OrderCompleted, order.driver.est_pickup_dist_km, order.driver.est_pickup_mins).await;
    }

    async fn notify_order_cancelled(&self, order: &Order, _reason: &str) {
        self.fan_out(&order.order_id, Some(order), None, NotifyEvent::OrderCancelled, None, None).await;
    }

    async fn notify_order_failed(&self, order: &Order, _reason: &str) {
        self.fan_out(&order.order_id, Some(order), None, NotifyEvent::OrderFailed, None, None).await;
    }

    async fn notify_order_rejected(&self, order_id: &OrderId, driver: &Driver, distance_km: f64, estimated_mins: i64) {
        self.fan_out(order_id, None, Some(driver), NotifyEvent::DriverRejected, Some(distance_km), Some(estimated_mins)).await;
    }

    async fn notify_driver_timeout(&self, order_id: &OrderId, driver: &Driver, distance_km: f64, estimated_mins: i64) {
        self.fan_out(order_id, None, Some(driver), NotifyEvent::DriverTimeout, Some(distance_km), Some(estimated_mins)).await;
    }
}

/// Events for which Card additionally sends a threaded banner reply
/// (spec.md §4.4).
fn carries_banner_reply(event: NotifyEvent) -> bool {
    matches!(
        event,
        NotifyEvent::ScheduledAccepted
            | NotifyEvent::ScheduledActivated
            | NotifyEvent::DriverAccepted
            | NotifyEvent::DriverArrived
            | NotifyEvent::CustomerOnBoard
    )
}

/// Which dashboard pages an event's Sse envelope targets. Not pinned by the
/// event table (spec.md §4.4 only names the page set, not the mapping).
fn pages_for(event: NotifyEvent) -> Vec<SsePage> {
    use NotifyEvent::*;
    use SsePage::*;
    match event {
        DriverAccepted | ScheduledActivated => vec![Dashboard, Orders, Dispatch, Map],
        DriverArrived | CustomerOnBoard => vec![Dashboard, Orders, Tracking, Map],
        OrderCompleted | OrderCancelled | OrderFailed => vec![Dashboard, Orders],
        DriverRejected | DriverTimeout => vec![Dashboard, Dispatch],
        _ => vec![Dashboard, Orders],
    }
}

/// Routes a `NotificationTask` to the C4 adapter for its channel (the
/// worker-pool side of C5 — spec.md §4.4's "workers call C4").
pub struct ChannelDispatchHandler {
    card_updater: Arc<dyn CardUpdater>,
    card_replier: Arc<dyn CardReplier>,
    card_messenger: Arc<dyn CardMessenger>,
    msg_updater: Arc<dyn MsgUpdater>,
    sse: Arc<dyn SseBroadcaster>,
}

impl ChannelDispatchHandler {
    pub fn new(
        card_updater: Arc<dyn CardUpdater>,
        card_replier: Arc<dyn CardReplier>,
        card_messenger: Arc<dyn CardMessenger>,
        msg_updater: Arc<dyn MsgUpdater>,
        sse: Arc<dyn SseBroadcaster>,
    ) -> Arc<Self> {
        Arc::new(Self {
            card_updater,
            card_replier,
            card_messenger,
            msg_updater,
            sse,
        })
    }

    async fn handle_card(&self, task: &rc_common::NotificationTask) {
        let Some(order) = &task.order else {
            warn!(order_id = %task.order_id, "card task missing order snapshot, dropping");
            return;
        };

        if task.event == NotifyEvent::ConversionMessage {
            if let Err(e) = self.card_messenger.send_conversion_message(order).await {
                warn!(order_id = %task.order_id, error = %e, "send_conversion_message failed");
            }
            return;
        }

        if let Err(e) = self.card_updater.update_card(order, task.event).await {
            warn!(order_id = %task.order_id, error = %e, "update_card failed");
        }

        if carries_banner_reply(task.event) {
            if let Err(e) = self
                .card_replier
                .reply_banner(order, task.driver.as_ref(), task.event, task.distance_km, task.estimated_mins)
                .await
            {
                warn!(order_id = %task.order_id, error = %e, "reply_banner failed");
            }
        }
    }

    async fn handle_msg(&self, task: &rc_common::NotificationTask) {
        let Some(order) = &task.order else {
            warn!(order_id = %task.order_id, "msg task missing order snapshot, dropping");
            return;
        };
        if let Err(e) = self.msg_updater.update_msg(order, task.event).await {
            warn!(order_id = %task.order_id, error = %e, "update_msg failed");
        }
    }

    fn handle_sse(&self, task: &rc_common::NotificationTask) {
        let envelope = rc_channels::sse::envelope(
            task.event,
            pages_for(task.event),
            &task.order_id,
            task.order.as_ref(),
            task.driver.as_ref(),
            task.distance_km,
            task.estimated_mins,
        );
        self.sse.broadcast(envelope);
    }
}

#[async_trait]
impl TaskHandler for ChannelDispatchHandler {
    async fn handle(&self, task: rc_common::NotificationTask) {
        match task.channel {
            NotifyChannel::Card => self.handle_card(&task).await,
            NotifyChannel::Msg => self.handle_msg(&task).await,
            NotifyChannel::Sse => self.handle_sse(&task),
        }
    }
}
