//! Capability interfaces C3 depends on but never constructs — injected by the
//! composition root (spec.md §9: "one-shot constructor graph").

use async_trait::async_trait;
use rc_common::{Driver, Order, OrderId};

/// The dispatch core's semantic entry points (spec.md §4.4). C3 calls these after
/// every committed transition; it never awaits delivery, matching the "fire and
/// observe via logs" contract — hence no `Result` on any of these.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify_order_accepted(&self, order: &Order, driver: &Driver, distance_km: f64, estimated_mins: i64);
    async fn notify_scheduled_order_accepted(&self, order: &Order, driver: &Driver);
    async fn notify_scheduled_order_activated(&self, order: &Order, driver: &Driver, distance_km: f64, estimated_mins: i64);
    async fn notify_scheduled_order_waiting(&self, order: &Order);
    async fn notify_order_converted(&self, order: &Order);
    async fn notify_order_conversion_message(&self, order: &Order);
    async fn notify_driver_arrived(&self, order: &Order, driver: &Driver, photo_taken: bool);
    async fn notify_customer_on_board(&self, order: &Order, driver: &Driver);
    async fn notify_order_completed(&self, order: &Order, driver: &Driver);
    async fn notify_order_cancelled(&self, order: &Order, reason: &str);
    async fn notify_order_failed(&self, order: &Order, reason: &str);
    async fn notify_order_rejected(&self, order_id: &OrderId, driver: &Driver, distance_km: f64, estimated_mins: i64);
    async fn notify_driver_timeout(&self, order_id: &OrderId, driver: &Driver, distance_km: f64, estimated_mins: i64);
}

/// Geolocation/routing estimate — out of scope per spec.md §1, consumed only through
/// this interface.
#[async_trait]
pub trait DistanceEstimator: Send + Sync {
    async fn calc_distance_and_mins(&self, driver: &Driver, order: &Order) -> (f64, i64);
}
