//! Wire/bus payload types (spec.md §3, §4.3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::model::{Driver, Order, OrderId, OrderStatus};

/// Published on the order-status bus subject whenever C3 commits a transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusEvent {
    pub order_id: OrderId,
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
    pub driver_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
    pub event_type: NotifyEvent,
    #[serde(default)]
    pub details: HashMap<String, Value>,
}

/// Published by C5/C6 whenever a card or message anchor changes, for the SSE channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiUpdateEvent {
    pub order_id: OrderId,
    pub channel_id: Option<String>,
    pub message_id: Option<String>,
    pub event_type: NotifyEvent,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub retry_count: u32,
}

/// The three output channels a notification task can target (spec.md §4.4/§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotifyChannel {
    Card,
    Msg,
    Sse,
}

/// The semantic reason a notification is being sent, driving reply-text selection (spec.md §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotifyEvent {
    DriverAccepted,
    ScheduledAccepted,
    ScheduledActivated,
    DriverArrived,
    CustomerOnBoard,
    OrderCompleted,
    OrderCancelled,
    OrderFailed,
    DriverRejected,
    DriverTimeout,
    ConversionMessage,
    ScheduledWaiting,
    OrderConverted,
}

/// One unit of work handed to the dispatch pool: a snapshot taken at enqueue time
/// (spec.md §3) so workers never re-read the order, plus which channel and under
/// which back-pressure policy it must be delivered (spec.md §4.4/§9).
///
/// `order` is `None` for the two entry points that take only an `OrderID`
/// (`DriverRejected`, `DriverTimeout` — spec.md §4.4) and are Sse-only; every
/// other event carries the full snapshot.
#[derive(Debug, Clone)]
pub struct NotificationTask {
    pub channel: NotifyChannel,
    pub order_id: OrderId,
    pub order: Option<Order>,
    pub driver: Option<Driver>,
    pub event: NotifyEvent,
    pub distance_km: Option<f64>,
    pub estimated_mins: Option<i64>,
    pub policy: DispatchPolicy,
}

/// Back-pressure policy attached to a task at the enqueue site, not the worker (spec.md §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Caller blocks until a queue slot frees up. Used for order-critical notifications.
    Block,
    /// Task is dropped (and counted) if the queue is full. Used for best-effort UI refreshes.
    Drop,
}
