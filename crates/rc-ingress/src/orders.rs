//! Order admission (spec.md §4.2/§9): the two-phase create that breaks the
//! ingress ↔ card cycle — allocate the record first, patch in the
//! chat-platform coordinates once the placeholder card has been sent.

use std::sync::Arc;

use chrono::Utc;
use rc_common::{DriverBinding, Fleet, Order, OrderId, OrderStatus, OrderType, Result};
use rc_order::{OrderRepository, OrderStateMachine, ShortIdGenerator};

use crate::text_parse::{self, ParsedOrder};

pub struct OrderIntake {
    orders: Arc<OrderRepository>,
    short_ids: Arc<ShortIdGenerator>,
    state_machine: Arc<OrderStateMachine>,
}

impl OrderIntake {
    pub fn new(orders: Arc<OrderRepository>, short_ids: Arc<ShortIdGenerator>, state_machine: Arc<OrderStateMachine>) -> Self {
        Self {
            orders,
            short_ids,
            state_machine,
        }
    }

    /// Phase 1: parse free-form text and persist a pre-card record.
    pub async fn create_from_text(&self, raw: &str, customer_group: Option<String>, passenger_id: Option<String>) -> Result<Order> {
        let ParsedOrder { fleet, ori_text, scheduled_at } = text_parse::parse(raw)?;
        self.create(fleet, ori_text, scheduled_at, customer_group, passenger_id).await
    }

    /// Phase 1 for structured ingress (spec.md §1: "free-form text or structured input").
    pub async fn create_structured(
        &self,
        fleet: Fleet,
        ori_text: String,
        scheduled_at: Option<chrono::DateTime<Utc>>,
        customer_group: Option<String>,
        passenger_id: Option<String>,
    ) -> Result<Order> {
        self.create(fleet, ori_text, scheduled_at, customer_group, passenger_id).await
    }

    async fn create(
        &self,
        fleet: Fleet,
        ori_text: String,
        scheduled_at: Option<chrono::DateTime<Utc>>,
        customer_group: Option<String>,
        passenger_id: Option<String>,
    ) -> Result<Order> {
        let short_id = self.short_ids.next().await?;
        let now = Utc::now();

        let order = Order {
            order_id: OrderId(bson::oid::ObjectId::new().to_hex()),
            short_id,
            order_type: if scheduled_at.is_some() { OrderType::Scheduled } else { OrderType::Instant },
            status: OrderStatus::Waiting,
            ori_text,
            fleet,
            customer_group,
            passenger_id,
            converted_from: None,
            scheduled_at,
            driver: DriverBinding::default(),
            card_channel_id: None,
            card_message_id: None,
            msg_messages: Vec::new(),
            pickup_certificate_url: None,
            is_photo_taken: false,
            created_at: now,
            updated_at: now,
        };

        self.orders.insert(&order).await?;

        if order.order_type == OrderType::Scheduled {
            self.state_machine.notify_scheduled_waiting(&order).await;
        }

        Ok(order)
    }

    /// Phase 3: patch in the card coordinates once the placeholder card has
    /// been published by the caller (spec.md §9).
    pub async fn attach_card(&self, order_id: &OrderId, channel_id: &str, message_id: &str) -> Result<Order> {
        self.state_machine.attach_card(order_id, channel_id, message_id).await
    }
}
