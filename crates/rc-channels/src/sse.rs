//! SSE channel: broadcasts an event envelope to operator-dashboard "pages"
//! in-process (spec.md §4.4). This is the one channel the core itself owns —
//! unlike Card/Msg it has no external SDK collaborator.

use chrono::Utc;
use rc_common::{Driver, NotifyEvent, Order};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::capability::SseBroadcaster as SseBroadcasterTrait;

/// Named UI views a broadcast can target (spec.md GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SsePage {
    Dashboard,
    Orders,
    Dispatch,
    Map,
    Tracking,
}

#[derive(Debug, Clone, Serialize)]
pub struct SseEnvelope {
    pub event: NotifyEvent,
    pub pages: Vec<SsePage>,
    pub data: Value,
}

pub fn envelope(
    event: NotifyEvent,
    pages: Vec<SsePage>,
    order_id: &rc_common::OrderId,
    order: Option<&Order>,
    driver: Option<&Driver>,
    distance_km: Option<f64>,
    estimated_mins: Option<i64>,
) -> SseEnvelope {
    let mut data = json!({
        "order_id": order_id.to_string(),
        "timestamp": Utc::now(),
        "distance_km": distance_km,
        "estimated_mins": estimated_mins,
    });

    if let (Some(order), Some(obj)) = (order, data.as_object_mut()) {
        obj.insert("fleet".to_string(), json!(order.fleet));
        obj.insert("ori_text".to_string(), json!(order.ori_text));
        obj.insert("short_id".to_string(), json!(order.short_id.to_string()));
    }

    if let (Some(driver), Some(obj)) = (driver, data.as_object_mut()) {
        obj.insert("driver_id".to_string(), json!(driver.driver_id));
        obj.insert("driver_name".to_string(), json!(driver.name));
        obj.insert("car_plate".to_string(), json!(driver.car_plate));
        obj.insert("car_color".to_string(), json!(driver.car_color));
    }

    SseEnvelope { event, pages, data }
}

/// In-process fan-out: each operator-dashboard connection subscribes to the
/// receiver side; a bounded lagging receiver drops the oldest events instead of
/// blocking the sender (broadcast back-pressure is not this channel's concern —
/// spec.md §4.4 only differentiates Card/Msg vs Driver* criticality).
pub struct SseHub {
    tx: broadcast::Sender<SseEnvelope>,
}

impl SseHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SseEnvelope> {
        self.tx.subscribe()
    }
}

impl SseBroadcasterTrait for SseHub {
    fn broadcast(&self, envelope: SseEnvelope) {
        // No subscribers is a normal state (no dashboard connected); ignore.
        let _ = self.tx.send(envelope);
    }
}
