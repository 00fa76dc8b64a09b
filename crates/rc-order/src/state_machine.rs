//! C3: owns every legal status transition, single-writer discipline on
//! `Status`, `Driver.*`, `ConvertedFrom`, `CardMessageID` (spec.md §4.2).

use std::sync::Arc;

use bson::doc;
use chrono::Utc;
use rc_common::{
    Driver, NotifyEvent, Order, OrderId, OrderStatus, OrderStatusEvent, RcError, Result,
};
use rc_bus::EventBus;
use tracing::info_span;
use tracing::Instrument;

use crate::capability::{DistanceEstimator, NotificationSink};
use crate::repository::{DriverRepository, OrderRepository};

pub struct OrderStateMachine {
    orders: Arc<OrderRepository>,
    drivers: Arc<DriverRepository>,
    bus: Arc<EventBus>,
    notifier: Arc<dyn NotificationSink>,
    distance: Arc<dyn DistanceEstimator>,
}

impl OrderStateMachine {
    pub fn new(
        orders: Arc<OrderRepository>,
        drivers: Arc<DriverRepository>,
        bus: Arc<EventBus>,
        notifier: Arc<dyn NotificationSink>,
        distance: Arc<dyn DistanceEstimator>,
    ) -> Self {
        Self {
            orders,
            drivers,
            bus,
            notifier,
            distance,
        }
    }

    /// Waiting → Enroute (instant) or Waiting → ScheduleAccepted (scheduled).
    /// Binds the driver under the CAS predicate of I2.
    pub async fn accept_order(&self, order_id: &OrderId, driver_id: &str) -> Result<Order> {
        let span = info_span!("order_transition", order_id = %order_id, driver_id, op = "accept");
        async {
            let order = self.orders.require_by_id(order_id).await?;
            let target_status = match order.order_type {
                rc_common::OrderType::Instant => OrderStatus::Enroute,
                rc_common::OrderType::Scheduled => OrderStatus::ScheduleAccepted,
            };

            let driver = self.drivers.bind_to_order(driver_id, order_id, target_status == OrderStatus::ScheduleAccepted).await?;

            let mut set_doc = doc! {
                "status": status_wire(target_status),
                "driver.assignedDriver": driver_id,
                "driver.name": &driver.name,
                "driver.carNo": &driver.car_plate,
                "driver.carColor": &driver.car_color,
            };

            let (distance_km, estimated_mins) = if target_status == OrderStatus::Enroute {
                let (km, mins) = self.distance.calc_distance_and_mins(&driver, &order).await;
                set_doc.insert("driver.estPickupDistKm", km);
                set_doc.insert("driver.estPickupMins", mins);
                (Some(km), Some(mins))
            } else {
                (None, None)
            };

            let updated = match self
                .orders
                .cas_update(order_id, Some(OrderStatus::Waiting), set_doc)
                .await
            {
                Ok(updated) => updated,
                Err(e) => {
                    // Order moved under us between the driver bind and the order
                    // CAS — release the driver we just bound rather than leave it
                    // stuck Busy on an order it never actually got.
                    let _ = self.drivers.reset(driver_id).await;
                    return Err(e);
                }
            };

            self.publish_status_event(&updated, order.status, target_status, Some(driver_id), NotifyEvent::DriverAccepted, None)
                .await?;

            match target_status {
                OrderStatus::Enroute => {
                    self.notifier
                        .notify_order_accepted(&updated, &driver, distance_km.unwrap_or_default(), estimated_mins.unwrap_or_default())
                        .await;
                }
                OrderStatus::ScheduleAccepted => {
                    self.notifier.notify_scheduled_order_accepted(&updated, &driver).await;
                }
                _ => unreachable!(),
            }

            Ok(updated)
        }
        .instrument(span)
        .await
    }

    /// C7-triggered: either converts a still-unaccepted scheduled order to instant
    /// (Waiting branch) or activates an already-accepted one straight to Enroute
    /// (ScheduleAccepted branch) — both gated on `ScheduledAt - now <= window` by
    /// the caller (spec.md §4.2).
    pub async fn activate_scheduled(&self, order_id: &OrderId) -> Result<Order> {
        let order = self.orders.require_by_id(order_id).await?;

        match order.status {
            OrderStatus::Waiting => self.convert_scheduled_to_instant(&order).await,
            OrderStatus::ScheduleAccepted => self.activate_scheduled_accepted(&order).await,
            other => Err(RcError::IllegalTransition {
                order_id: order_id.to_string(),
                from: format!("{other:?}"),
                to: "Enroute-or-converted".to_string(),
            }),
        }
    }

    async fn convert_scheduled_to_instant(&self, order: &Order) -> Result<Order> {
        let span = info_span!("order_transition", order_id = %order.order_id, op = "convert");
        async {
            let set_doc = doc! {
                "orderType": "INSTANT",
                "convertedFrom": "scheduled",
                "status": status_wire(OrderStatus::Waiting),
                "driver.assignedDriver": bson::Bson::Null,
            };

            let updated = self
                .orders
                .cas_update(&order.order_id, Some(OrderStatus::Waiting), set_doc)
                .await?;

            self.publish_status_event(&updated, OrderStatus::Waiting, OrderStatus::Waiting, None, NotifyEvent::OrderConverted, None)
                .await?;

            self.notifier.notify_order_converted(&updated).await;
            self.notifier.notify_order_conversion_message(&updated).await;

            Ok(updated)
        }
        .instrument(span)
        .await
    }

    async fn activate_scheduled_accepted(&self, order: &Order) -> Result<Order> {
        let span = info_span!("order_transition", order_id = %order.order_id, op = "activate");
        async {
            let driver_id = order
                .driver
                .assigned_driver
                .clone()
                .ok_or_else(|| RcError::DriverNotFound(order.order_id.to_string()))?;
            let mut driver = self.drivers.require_by_id(&driver_id).await?;
            let (km, mins) = self.distance.calc_distance_and_mins(&driver, order).await;

            let set_doc = doc! {
                "status": status_wire(OrderStatus::Enroute),
                "driver.estPickupDistKm": km,
                "driver.estPickupMins": mins,
            };

            let updated = self
                .orders
                .cas_update(&order.order_id, Some(OrderStatus::ScheduleAccepted), set_doc)
                .await?;

            driver.current_order_schedule_id = None;
            driver.current_order_id = Some(order.order_id.clone());
            self.drivers.update(&driver).await?;

            self.publish_status_event(
                &updated,
                OrderStatus::ScheduleAccepted,
                OrderStatus::Enroute,
                Some(&driver_id),
                NotifyEvent::ScheduledActivated,
                None,
            )
            .await?;

            self.notifier
                .notify_scheduled_order_activated(&updated, &driver, km, mins)
                .await;

            Ok(updated)
        }
        .instrument(span)
        .await
    }

    pub async fn driver_arrived(&self, order_id: &OrderId, photo_taken: bool) -> Result<Order> {
        let span = info_span!("order_transition", order_id = %order_id, op = "arrived");
        async {
            let order = self.orders.require_by_id(order_id).await?;
            let driver_id = order
                .driver
                .assigned_driver
                .clone()
                .ok_or_else(|| RcError::DriverNotFound(order_id.to_string()))?;
            let driver = self.drivers.require_by_id(&driver_id).await?;

            let set_doc = doc! { "status": status_wire(OrderStatus::DriverArrived), "isPhotoTaken": photo_taken };
            let updated = self
                .orders
                .cas_update(order_id, Some(OrderStatus::Enroute), set_doc)
                .await?;

            self.publish_status_event(&updated, OrderStatus::Enroute, OrderStatus::DriverArrived, Some(&driver_id), NotifyEvent::DriverArrived, None)
                .await?;
            self.notifier.notify_driver_arrived(&updated, &driver, photo_taken).await;

            Ok(updated)
        }
        .instrument(span)
        .await
    }

    pub async fn customer_on_board(&self, order_id: &OrderId) -> Result<Order> {
        let span = info_span!("order_transition", order_id = %order_id, op = "on_board");
        async {
            let order = self.orders.require_by_id(order_id).await?;
            let driver_id = order
                .driver
                .assigned_driver
                .clone()
                .ok_or_else(|| RcError::DriverNotFound(order_id.to_string()))?;
            let driver = self.drivers.require_by_id(&driver_id).await?;

            let updated = self
                .orders
                .cas_update(order_id, Some(OrderStatus::DriverArrived), doc! { "status": status_wire(OrderStatus::Executing) })
                .await?;

            self.publish_status_event(&updated, OrderStatus::DriverArrived, OrderStatus::Executing, Some(&driver_id), NotifyEvent::CustomerOnBoard, None)
                .await?;
            self.notifier.notify_customer_on_board(&updated, &driver).await;

            Ok(updated)
        }
        .instrument(span)
        .await
    }

    pub async fn complete_order(&self, order_id: &OrderId) -> Result<Order> {
        let span = info_span!("order_transition", order_id = %order_id, op = "complete");
        async {
            let order = self.orders.require_by_id(order_id).await?;
            let driver_id = order
                .driver
                .assigned_driver
                .clone()
                .ok_or_else(|| RcError::DriverNotFound(order_id.to_string()))?;
            let mut driver = self.drivers.require_by_id(&driver_id).await?;

            let updated = self
                .orders
                .cas_update(order_id, Some(OrderStatus::Executing), doc! { "status": status_wire(OrderStatus::Completed) })
                .await?;

            driver.status = rc_common::DriverStatus::Idle;
            driver.current_order_id = None;
            self.drivers.update(&driver).await?;

            self.publish_status_event(&updated, OrderStatus::Executing, OrderStatus::Completed, Some(&driver_id), NotifyEvent::OrderCompleted, None)
                .await?;
            self.notifier.notify_order_completed(&updated, &driver).await;

            Ok(updated)
        }
        .instrument(span)
        .await
    }

    /// Waiting | ScheduleAccepted | Enroute | DriverArrived → Cancelled. The
    /// transition graph in spec.md §4.2 only lists the first two predecessors,
    /// but §8 scenario 6 cancels an `Enroute` order — extended here to cover
    /// every pre-`Executing` state (see DESIGN.md).
    pub async fn cancel_order(&self, order_id: &OrderId, reason: &str) -> Result<Order> {
        let span = info_span!("order_transition", order_id = %order_id, op = "cancel");
        async {
            let order = self.orders.require_by_id(order_id).await?;
            if order.status.is_terminal() {
                return Err(RcError::IllegalTransition {
                    order_id: order_id.to_string(),
                    from: format!("{:?}", order.status),
                    to: "Cancelled".to_string(),
                });
            }

            let from_status = order.status;
            let updated = self
                .orders
                .cas_update(order_id, Some(from_status), doc! { "status": status_wire(OrderStatus::Cancelled) })
                .await?;

            if let Some(driver_id) = &order.driver.assigned_driver {
                if let Ok(mut driver) = self.drivers.require_by_id(driver_id).await {
                    driver.status = rc_common::DriverStatus::Idle;
                    driver.current_order_id = None;
                    driver.current_order_schedule_id = None;
                    self.drivers.update(&driver).await?;
                }
            }

            self.publish_status_event(&updated, from_status, OrderStatus::Cancelled, order.driver.assigned_driver.as_deref(), NotifyEvent::OrderCancelled, Some(reason))
                .await?;
            self.notifier.notify_order_cancelled(&updated, reason).await;

            Ok(updated)
        }
        .instrument(span)
        .await
    }

    pub async fn fail_order(&self, order_id: &OrderId, reason: &str) -> Result<Order> {
        let span = info_span!("order_transition", order_id = %order_id, op = "fail");
        async {
            let updated = self
                .orders
                .cas_update(order_id, Some(OrderStatus::Waiting), doc! { "status": status_wire(OrderStatus::Failed) })
                .await?;

            self.publish_status_event(&updated, OrderStatus::Waiting, OrderStatus::Failed, None, NotifyEvent::OrderFailed, Some(reason))
                .await?;
            self.notifier.notify_order_failed(&updated, reason).await;

            Ok(updated)
        }
        .instrument(span)
        .await
    }

    /// No status transition — the order stays in the `Waiting` pool (spec.md §4.3).
    pub async fn reject_driver(&self, order_id: &OrderId, driver: &Driver, distance_km: f64, estimated_mins: i64) {
        self.notifier
            .notify_order_rejected(order_id, driver, distance_km, estimated_mins)
            .await;
    }

    pub async fn driver_timeout(&self, order_id: &OrderId, driver: &Driver, distance_km: f64, estimated_mins: i64) {
        self.notifier
            .notify_driver_timeout(order_id, driver, distance_km, estimated_mins)
            .await;
    }

    /// Phase 3 of the two-phase order create (spec.md §9's cycle-breaking
    /// redesign): patches in the chat-platform coordinates once the placeholder
    /// card has been published. C3 owns `CardMessageID` even here.
    pub async fn attach_card(&self, order_id: &OrderId, channel_id: &str, message_id: &str) -> Result<Order> {
        let set_doc = doc! {
            "cardChannelId": channel_id,
            "cardMessageId": message_id,
        };
        self.orders.cas_update(order_id, None, set_doc).await
    }

    /// C3 is the sole caller of the notifier even for the one admission-time
    /// event (spec.md §4.2): ingress never talks to the notifier directly.
    pub async fn notify_scheduled_waiting(&self, order: &Order) {
        self.notifier.notify_scheduled_order_waiting(order).await;
    }

    /// Operator "reset driver" slash command (spec.md §4.5). C3 owns `Driver.*`
    /// even for operator-triggered writes.
    pub async fn reset_driver(&self, identifier: &str) -> Result<Driver> {
        let driver = self
            .drivers
            .find_by_identifier(identifier)
            .await?
            .ok_or_else(|| RcError::DriverNotFound(identifier.to_string()))?;

        let before = self.drivers.reset(&driver.driver_id).await?;

        if let Some(order_id) = &before.current_order_schedule_id {
            let set_doc = doc! {
                "status": status_wire(OrderStatus::Waiting),
                "driver.assignedDriver": bson::Bson::Null,
            };
            if let Ok(order) = self.orders.require_by_id(order_id).await {
                if order.status == OrderStatus::ScheduleAccepted {
                    let _ = self
                        .orders
                        .cas_update(order_id, Some(OrderStatus::ScheduleAccepted), set_doc)
                        .await;
                }
            }
        }

        Ok(before)
    }

    async fn publish_status_event(
        &self,
        order: &Order,
        old_status: OrderStatus,
        new_status: OrderStatus,
        driver_id: Option<&str>,
        event_type: NotifyEvent,
        reason: Option<&str>,
    ) -> Result<()> {
        let event = OrderStatusEvent {
            order_id: order.order_id.clone(),
            old_status,
            new_status,
            driver_id: driver_id.map(str::to_string),
            timestamp: Utc::now(),
            reason: reason.map(str::to_string),
            event_type,
            details: Default::default(),
        };
        self.bus
            .publish_order_status(&event)
            .await
            .map_err(|e| RcError::Bus(e.to_string()))
    }
}

fn status_wire(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Waiting => "WAITING",
        OrderStatus::ScheduleAccepted => "SCHEDULE_ACCEPTED",
        OrderStatus::Enroute => "ENROUTE",
        OrderStatus::DriverArrived => "DRIVER_ARRIVED",
        OrderStatus::Executing => "EXECUTING",
        OrderStatus::Completed => "COMPLETED",
        OrderStatus::Failed => "FAILED",
        OrderStatus::Cancelled => "CANCELLED",
    }
}

#[cfg(test)]
mod tests {
    // `cas_update`'s atomicity is MongoDB's `find_one_and_update`, which has no
    // faithful in-memory double; transition-graph and CAS-race coverage for this
    // module is integration-level only, against a live database (see DESIGN.md).
}
