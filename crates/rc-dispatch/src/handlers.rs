//! C6: subscribes to the bus's UI-update topics and drives this instance's
//! local C4 adapters so sibling instances that don't own the message still
//! reflect the latest state (spec.md §4.7).

use std::sync::Arc;

use rc_bus::{EventBus, TOPIC_CARD_UPDATE, TOPIC_MSG_UPDATE};
use rc_channels::{CardUpdater, MsgUpdater};
use rc_common::UiUpdateEvent;
use rc_order::OrderRepository;
use tokio::sync::Notify;
use tracing::{debug, warn};

pub struct ChannelHandlers {
    orders: Arc<OrderRepository>,
    card: Arc<dyn CardUpdater>,
    msg: Arc<dyn MsgUpdater>,
}

impl ChannelHandlers {
    pub fn new(orders: Arc<OrderRepository>, card: Arc<dyn CardUpdater>, msg: Arc<dyn MsgUpdater>) -> Arc<Self> {
        Arc::new(Self { orders, card, msg })
    }

    pub fn subscribe(self: &Arc<Self>, bus: &Arc<EventBus>, shutdown: Arc<Notify>) {
        let card_handlers = self.clone();
        bus.subscribe(
            TOPIC_CARD_UPDATE,
            move |payload| {
                let handlers = card_handlers.clone();
                async move { handlers.handle_card_update(payload).await }
            },
            shutdown.clone(),
        );

        let msg_handlers = self.clone();
        bus.subscribe(
            TOPIC_MSG_UPDATE,
            move |payload| {
                let handlers = msg_handlers.clone();
                async move { handlers.handle_msg_update(payload).await }
            },
            shutdown,
        );
    }

    async fn handle_card_update(&self, payload: String) {
        let event: UiUpdateEvent = match serde_json::from_str(&payload) {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "dropping malformed ui.card.update payload");
                return;
            }
        };

        let order = match self.orders.find_by_id(&event.order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                debug!(order_id = %event.order_id, "card update for unknown order, dropping");
                return;
            }
            Err(e) => {
                warn!(error = %e, order_id = %event.order_id, "lookup failed, dropping card update");
                return;
            }
        };

        // Invariant I3: the event's coordinates must still match the order's
        // current anchors, otherwise this is a stale card (spec.md §4.7).
        if (order.card_channel_id.as_deref(), order.card_message_id.as_deref())
            != (event.channel_id.as_deref(), event.message_id.as_deref())
        {
            debug!(order_id = %event.order_id, "stale card coordinates, dropping");
            return;
        }

        if let Err(e) = self.card.update_card(&order, event.event_type).await {
            warn!(error = %e, order_id = %event.order_id, "card adapter failed");
        }
    }

    async fn handle_msg_update(&self, payload: String) {
        let event: UiUpdateEvent = match serde_json::from_str(&payload) {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "dropping malformed ui.msg.update payload");
                return;
            }
        };

        let order = match self.orders.find_by_id(&event.order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                debug!(order_id = %event.order_id, "msg update for unknown order, dropping");
                return;
            }
            Err(e) => {
                warn!(error = %e, order_id = %event.order_id, "lookup failed, dropping msg update");
                return;
            }
        };

        if order.msg_messages.is_empty() {
            return;
        }

        if let Err(e) = self.msg.update_msg(&order, event.event_type).await {
            warn!(error = %e, order_id = %event.order_id, "msg adapter failed");
        }
    }
}
