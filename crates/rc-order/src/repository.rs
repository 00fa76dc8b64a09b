//! Order/driver persistence with atomic compare-and-set status transitions (C2).

use bson::doc;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::{Collection, Database};
use rc_common::{Driver, Fleet, Order, OrderId, OrderStatus, RcError, Result};

pub struct OrderRepository {
    collection: Collection<Order>,
}

impl OrderRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("orders"),
        }
    }

    pub async fn insert(&self, order: &Order) -> Result<()> {
        self.collection.insert_one(order).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>> {
        Ok(self.collection.find_one(doc! { "_id": &id.0 }).await?)
    }

    pub async fn require_by_id(&self, id: &OrderId) -> Result<Order> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RcError::OrderNotFound(id.to_string()))
    }

    /// Footer-protocol fallback (spec.md §6): when a reply's footer can't be
    /// parsed, look the order up by the card coordinates it was sent to.
    pub async fn find_by_card_coordinates(&self, channel_id: &str, message_id: &str) -> Result<Option<Order>> {
        Ok(self
            .collection
            .find_one(doc! { "cardChannelId": channel_id, "cardMessageId": message_id })
            .await?)
    }

    pub async fn find_scheduled_due_for_activation(
        &self,
        window_end: chrono::DateTime<Utc>,
    ) -> Result<Vec<Order>> {
        let cursor = self
            .collection
            .find(doc! {
                "orderType": "SCHEDULED",
                "status": { "$in": ["WAITING", "SCHEDULE_ACCEPTED"] },
                "scheduledAt": { "$lte": bson::DateTime::from_chrono(window_end) },
            })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Compare-and-set the order's status, bumping `updatedAt`. `expected_status`
    /// is `None` to match any current status. Fails with `ErrIllegalTransition`
    /// if no document matches (either not found, or status already moved — this
    /// is what makes repeated scheduler ticks and concurrent accepts safe, spec.md I1/§8).
    pub async fn cas_update(
        &self,
        id: &OrderId,
        expected_status: Option<OrderStatus>,
        update: bson::Document,
    ) -> Result<Order> {
        let mut filter = doc! { "_id": &id.0 };
        if let Some(status) = expected_status {
            filter.insert("status", status_wire(status));
        }

        let mut set_doc = update;
        set_doc.insert(
            "updatedAt",
            bson::DateTime::from_chrono(Utc::now()),
        );

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.collection
            .find_one_and_update(filter, doc! { "$set": set_doc })
            .with_options(options)
            .await?
            .ok_or_else(|| RcError::IllegalTransition {
                order_id: id.to_string(),
                from: expected_status
                    .map(|s| format!("{s:?}"))
                    .unwrap_or_else(|| "any".to_string()),
                to: "requested".to_string(),
            })
    }

    /// `clean-failed-orders` slash command (spec.md §6).
    pub async fn delete_by_fleet_and_status(&self, fleet: Fleet, status: OrderStatus) -> Result<u64> {
        let result = self
            .collection
            .delete_many(doc! { "fleet": fleet_wire(fleet), "status": status_wire(status) })
            .await?;
        Ok(result.deleted_count)
    }

    /// `wei-empty-order-and-driver` slash command (spec.md §6).
    pub async fn delete_all_for_fleet(&self, fleet: Fleet) -> Result<u64> {
        let result = self.collection.delete_many(doc! { "fleet": fleet_wire(fleet) }).await?;
        Ok(result.deleted_count)
    }
}

fn fleet_wire(fleet: Fleet) -> &'static str {
    match fleet {
        Fleet::Rsk => "RSK",
        Fleet::Kd => "KD",
        Fleet::Wei => "WEI",
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

pub struct DriverRepository {
    collection: Collection<Driver>,
}

impl DriverRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("drivers"),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Driver>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    pub async fn require_by_id(&self, id: &str) -> Result<Driver> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RcError::DriverNotFound(id.to_string()))
    }

    pub async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Driver>> {
        Ok(self
            .collection
            .find_one(doc! {
                "$or": [
                    { "name": identifier },
                    { "account": identifier },
                    { "driverNo": identifier },
                ]
            })
            .await?)
    }

    /// Bind a driver to an order under CAS: only succeeds while the driver is Idle.
    pub async fn bind_to_order(
        &self,
        driver_id: &str,
        order_id: &OrderId,
        scheduled: bool,
    ) -> Result<Driver> {
        let field = if scheduled {
            "currentOrderScheduleId"
        } else {
            "currentOrderId"
        };

        self.collection
            .find_one_and_update(
                doc! { "_id": driver_id, "status": "IDLE" },
                doc! { "$set": { "status": "BUSY", field: &order_id.0 } },
            )
            .with_options(
                FindOneAndUpdateOptions::builder()
                    .return_document(ReturnDocument::After)
                    .build(),
            )
            .await?
            .ok_or_else(|| RcError::DriverNotFound(driver_id.to_string()))
    }

    pub async fn update(&self, driver: &Driver) -> Result<()> {
        self.collection
            .replace_one(doc! { "_id": &driver.driver_id }, driver)
            .await?;
        Ok(())
    }

    /// `search-online-drivers` slash command (spec.md §6): idle + busy, optionally
    /// narrowed to one fleet.
    pub async fn find_online(&self, fleet: Option<Fleet>) -> Result<Vec<Driver>> {
        let mut filter = doc! { "status": { "$in": ["IDLE", "BUSY"] } };
        if let Some(fleet) = fleet {
            filter.insert("fleet", fleet_wire(fleet));
        }
        let cursor = self.collection.find(filter).await?;
        Ok(cursor.try_collect().await?)
    }

    /// `wei-empty-order-and-driver` slash command (spec.md §6).
    pub async fn reset_all_for_fleet(&self, fleet: Fleet) -> Result<u64> {
        let result = self
            .collection
            .update_many(
                doc! { "fleet": fleet_wire(fleet) },
                doc! {
                    "$set": { "status": "IDLE" },
                    "$unset": { "currentOrderId": "", "currentOrderScheduleId": "" },
                },
            )
            .await?;
        Ok(result.modified_count)
    }

    /// Operator "reset driver" slash command (spec.md §4.5): idle the driver and
    /// clear both order bindings unconditionally.
    pub async fn reset(&self, driver_id: &str) -> Result<Driver> {
        self.collection
            .find_one_and_update(
                doc! { "_id": driver_id },
                doc! {
                    "$set": { "status": "IDLE" },
                    "$unset": { "currentOrderId": "", "currentOrderScheduleId": "" },
                },
            )
            .with_options(
                FindOneAndUpdateOptions::builder()
                    .return_document(ReturnDocument::Before)
                    .build(),
            )
            .await?
            .ok_or_else(|| RcError::DriverNotFound(driver_id.to_string()))
    }
}
