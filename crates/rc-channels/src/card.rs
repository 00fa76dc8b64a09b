//! Card (chat-platform) adapter: edits the order embed in place, sends threaded
//! banner replies, and publishes `ui.card.update` so sibling instances that own
//! the message can edit it too (spec.md §4.4).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rc_bus::EventBus;
use rc_common::{Driver, NotifyEvent, Order, Result, UiUpdateEvent};
use tracing::warn;

use crate::capability::{CardEmbed, CardMessenger, CardReplier, CardUpdater, ChatPlatformClient};
use crate::{footer, reply_text};

pub struct CardAdapter {
    client: Arc<dyn ChatPlatformClient>,
    bus: Arc<EventBus>,
}

impl CardAdapter {
    pub fn new(client: Arc<dyn ChatPlatformClient>, bus: Arc<EventBus>) -> Self {
        Self { client, bus }
    }
}

#[async_trait]
impl CardUpdater for CardAdapter {
    async fn update_card(&self, order: &Order, event: NotifyEvent) -> Result<()> {
        let (Some(channel_id), Some(message_id)) = (&order.card_channel_id, &order.card_message_id)
        else {
            // No card exists yet for this order — no-op (spec.md §4.4).
            return Ok(());
        };

        self.client
            .edit_card(
                channel_id,
                message_id,
                CardEmbed {
                    title: format!("{} {}", order.fleet, order.short_id),
                    description: order.ori_text.clone(),
                    color: 0x95A5A6,
                    footer: footer::render(order.order_id.as_str()),
                },
            )
            .await?;

        let ui_event = UiUpdateEvent {
            order_id: order.order_id.clone(),
            channel_id: Some(channel_id.clone()),
            message_id: Some(message_id.clone()),
            event_type: event,
            timestamp: Utc::now(),
            retry_count: 0,
        };

        if let Err(e) = self.bus.publish_card_update(&ui_event).await {
            warn!(order_id = %order.order_id, error = %e, "failed to publish ui.card.update");
        }

        Ok(())
    }
}

#[async_trait]
impl CardReplier for CardAdapter {
    async fn reply_banner(
        &self,
        order: &Order,
        driver: Option<&Driver>,
        event: NotifyEvent,
        distance_km: Option<f64>,
        estimated_mins: Option<i64>,
    ) -> Result<()> {
        let Some(channel_id) = &order.card_channel_id else {
            return Ok(());
        };
        let Some(message_id) = &order.card_message_id else {
            return Ok(());
        };

        let (car_plate, car_color, driver_name) = driver
            .map(|d| (d.car_plate.as_str(), d.car_color.as_str(), d.name.as_str()))
            .unwrap_or(("", "", ""));

        let text = reply_text::render(&reply_text::ReplyTextInput {
            fleet: order.fleet,
            short_id: &order.short_id,
            order_type: order.order_type,
            event,
            ori_text: &order.ori_text,
            car_plate,
            car_color,
            driver_name,
            distance_km,
            estimated_mins,
        });

        self.client
            .send_banner_reply(channel_id, message_id, &text, reply_text::event_color(event))
            .await
    }
}

#[async_trait]
impl CardMessenger for CardAdapter {
    async fn send_conversion_message(&self, order: &Order) -> Result<()> {
        let Some(channel_id) = &order.card_channel_id else {
            return Ok(());
        };

        let text = reply_text::render(&reply_text::ReplyTextInput {
            fleet: order.fleet,
            short_id: &order.short_id,
            order_type: order.order_type,
            event: NotifyEvent::ConversionMessage,
            ori_text: &order.ori_text,
            car_plate: "",
            car_color: "",
            driver_name: "",
            distance_km: None,
            estimated_mins: None,
        });

        self.client.send_message(channel_id, &text).await.map(|_| ())
    }
}
