//! Order and Driver entities (spec.md §3).

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Globally unique, opaque 24-byte hex-like order identifier. Stable forever (I4).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human display id, e.g. `#7431`. Stable once assigned (I4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortId(pub String);

impl ShortId {
    pub fn from_sequence(seq: u64) -> Self {
        Self(format!("#{}", seq))
    }
}

impl std::fmt::Display for ShortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Instant,
    Scheduled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Waiting,
    ScheduleAccepted,
    Enroute,
    DriverArrived,
    Executing,
    Completed,
    Failed,
    Cancelled,
}

impl OrderStatus {
    /// Terminal per invariant I5 — no further driver-bound state changes.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Fleet {
    Rsk,
    Kd,
    Wei,
}

impl std::fmt::Display for Fleet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Fleet::Rsk => "RSK",
            Fleet::Kd => "KD",
            Fleet::Wei => "WEI",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverStatus {
    Idle,
    Busy,
    Offline,
}

/// A single prior messaging-platform send, part of `Order::msg_messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MsgAnchor {
    pub message_id: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub sent_at: DateTime<Utc>,
}

/// Driver binding nested under an order. Written only by C3 (single-writer discipline).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverBinding {
    pub assigned_driver: Option<String>,
    pub name: Option<String>,
    pub car_no: Option<String>,
    pub car_color: Option<String>,
    pub est_pickup_dist_km: Option<f64>,
    pub est_pickup_mins: Option<i64>,
    pub adjust_mins: Option<i64>,
    pub arrival_deviation_secs: Option<i64>,
}

impl DriverBinding {
    pub fn is_empty(&self) -> bool {
        self.assigned_driver.is_none()
    }
}

/// The central entity (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub order_id: OrderId,
    pub short_id: ShortId,
    pub order_type: OrderType,
    pub status: OrderStatus,

    pub ori_text: String,
    pub fleet: Fleet,
    pub customer_group: Option<String>,
    pub passenger_id: Option<String>,
    pub converted_from: Option<String>,

    #[serde(default, with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional")]
    pub scheduled_at: Option<DateTime<Utc>>,

    pub driver: DriverBinding,

    pub card_channel_id: Option<String>,
    pub card_message_id: Option<String>,
    #[serde(default)]
    pub msg_messages: Vec<MsgAnchor>,

    pub pickup_certificate_url: Option<String>,
    #[serde(default)]
    pub is_photo_taken: bool,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Long-lived driver entity (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    #[serde(rename = "_id")]
    pub driver_id: String,
    pub name: String,
    pub car_plate: String,
    pub car_color: String,
    pub car_model: String,
    pub jko_account: Option<String>,
    pub driver_no: String,
    pub account: String,
    pub fleet: Fleet,
    pub status: DriverStatus,
    pub current_order_id: Option<OrderId>,
    pub current_order_schedule_id: Option<OrderId>,
    pub fcm_token: Option<String>,
}
