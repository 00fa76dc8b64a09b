//! Msg (messaging-platform) adapter: edits the most recent prior send and
//! publishes `ui.msg.update` (spec.md §4.4).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rc_bus::EventBus;
use rc_common::{NotifyEvent, Order, Result, UiUpdateEvent};
use tracing::warn;

use crate::capability::{MessagingPlatformClient, MsgUpdater};

pub struct MsgAdapter {
    client: Arc<dyn MessagingPlatformClient>,
    bus: Arc<EventBus>,
}

impl MsgAdapter {
    pub fn new(client: Arc<dyn MessagingPlatformClient>, bus: Arc<EventBus>) -> Self {
        Self { client, bus }
    }
}

#[async_trait]
impl MsgUpdater for MsgAdapter {
    async fn update_msg(&self, order: &Order, event: NotifyEvent) -> Result<()> {
        let Some(anchor) = order.msg_messages.last() else {
            return Ok(());
        };

        self.client
            .edit_message(&anchor.message_id, &order.ori_text)
            .await?;

        let ui_event = UiUpdateEvent {
            order_id: order.order_id.clone(),
            channel_id: None,
            message_id: Some(anchor.message_id.clone()),
            event_type: event,
            timestamp: Utc::now(),
            retry_count: 0,
        };

        if let Err(e) = self.bus.publish_msg_update(&ui_event).await {
            warn!(order_id = %order.order_id, error = %e, "failed to publish ui.msg.update");
        }

        Ok(())
    }
}
