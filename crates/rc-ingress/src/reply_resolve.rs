//! Resolves a threaded reply to the order it belongs to (spec.md §6): parse
//! the footer first; fall back to a `(channel_id, message_id)` lookup for
//! older cards whose footer predates the protocol.

use std::sync::Arc;

use rc_channels::footer;
use rc_common::{Order, OrderId, Result};
use rc_order::OrderRepository;

pub async fn resolve_reply(orders: &Arc<OrderRepository>, footer_text: &str, channel_id: &str, message_id: &str) -> Result<Option<Order>> {
    if let Some(order_id) = footer::parse_order_id(footer_text) {
        if let Some(order) = orders.find_by_id(&OrderId(order_id)).await? {
            return Ok(Some(order));
        }
    }

    orders.find_by_card_coordinates(channel_id, message_id).await
}
