//! Wires driver-initiated actions to C3 (spec.md §2: "Ingress Glue ... wire
//! driver-initiated actions (accept/arrive/board/complete/cancel/reject) to
//! C3 then C5" — C5 is invoked internally by the state machine via the
//! injected `NotificationSink`, so this layer only calls C3).

use std::sync::Arc;

use rc_common::{Driver, Order, OrderId, Result};
use rc_order::OrderStateMachine;

pub struct DriverActions {
    state_machine: Arc<OrderStateMachine>,
}

impl DriverActions {
    pub fn new(state_machine: Arc<OrderStateMachine>) -> Self {
        Self { state_machine }
    }

    pub async fn accept(&self, order_id: &OrderId, driver_id: &str) -> Result<Order> {
        self.state_machine.accept_order(order_id, driver_id).await
    }

    pub async fn arrive(&self, order_id: &OrderId, photo_taken: bool) -> Result<Order> {
        self.state_machine.driver_arrived(order_id, photo_taken).await
    }

    pub async fn board(&self, order_id: &OrderId) -> Result<Order> {
        self.state_machine.customer_on_board(order_id).await
    }

    pub async fn complete(&self, order_id: &OrderId) -> Result<Order> {
        self.state_machine.complete_order(order_id).await
    }

    pub async fn cancel(&self, order_id: &OrderId, reason: &str) -> Result<Order> {
        self.state_machine.cancel_order(order_id, reason).await
    }

    pub async fn reject(&self, order_id: &OrderId, driver: &Driver, distance_km: f64, estimated_mins: i64) {
        self.state_machine.reject_driver(order_id, driver, distance_km, estimated_mins).await;
    }

    pub async fn driver_timeout(&self, order_id: &OrderId, driver: &Driver, distance_km: f64, estimated_mins: i64) {
        self.state_machine.driver_timeout(order_id, driver, distance_km, estimated_mins).await;
    }
}
