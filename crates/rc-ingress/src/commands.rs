//! Operator slash commands (spec.md §6 table). All replies are ephemeral
//! plain text, returned to the caller rather than sent directly — sending is
//! the out-of-scope chat-platform SDK's job.

use std::sync::Arc;

use rc_common::{Fleet, OrderStatus, OrderType, Result};
use rc_order::{DriverRepository, OrderRepository, OrderStateMachine};

use crate::orders::OrderIntake;

pub enum SearchScheduledFilter {
    Assigned,
    Unassigned,
}

pub struct SlashCommands {
    orders: Arc<OrderRepository>,
    drivers: Arc<DriverRepository>,
    state_machine: Arc<OrderStateMachine>,
    intake: Arc<OrderIntake>,
}

impl SlashCommands {
    pub fn new(
        orders: Arc<OrderRepository>,
        drivers: Arc<DriverRepository>,
        state_machine: Arc<OrderStateMachine>,
        intake: Arc<OrderIntake>,
    ) -> Self {
        Self {
            orders,
            drivers,
            state_machine,
            intake,
        }
    }

    pub fn ping(&self) -> &'static str {
        "Pong!"
    }

    pub async fn reset_driver(&self, identifier: &str) -> Result<String> {
        let driver = self.state_machine.reset_driver(identifier).await?;
        Ok(format!("{} ({}) reset to idle", driver.name, driver.driver_id))
    }

    pub async fn clean_failed_orders(&self, fleet: Fleet) -> Result<String> {
        let count = self.orders.delete_by_fleet_and_status(fleet, OrderStatus::Failed).await?;
        Ok(format!("deleted {count} failed {fleet} orders"))
    }

    pub async fn search_scheduled(&self, filter: SearchScheduledFilter) -> Result<String> {
        let scheduled = self
            .orders
            .find_scheduled_due_for_activation(chrono::Utc::now() + chrono::Duration::days(365))
            .await?;

        let matching: Vec<_> = scheduled
            .into_iter()
            .filter(|o| o.order_type == OrderType::Scheduled)
            .filter(|o| match filter {
                SearchScheduledFilter::Assigned => o.driver.assigned_driver.is_some(),
                SearchScheduledFilter::Unassigned => o.driver.assigned_driver.is_none(),
            })
            .collect();

        if matching.is_empty() {
            return Ok("no matching scheduled orders".to_string());
        }

        let lines: Vec<String> = matching
            .iter()
            .map(|o| format!("{} {} — {}", o.short_id, o.fleet, o.ori_text))
            .collect();
        Ok(lines.join("\n"))
    }

    pub async fn search_online_drivers(&self, fleet: Option<Fleet>) -> Result<String> {
        let drivers = self.drivers.find_online(fleet).await?;
        if drivers.is_empty() {
            return Ok("no online drivers".to_string());
        }
        let lines: Vec<String> = drivers
            .iter()
            .map(|d| format!("{} ({:?}) — {}", d.name, d.status, d.fleet))
            .collect();
        Ok(lines.join("\n"))
    }

    pub async fn wei_empty_order_and_driver(&self) -> Result<String> {
        let orders_deleted = self.orders.delete_all_for_fleet(Fleet::Wei).await?;
        let drivers_reset = self.drivers.reset_all_for_fleet(Fleet::Wei).await?;
        Ok(format!("deleted {orders_deleted} WEI orders, reset {drivers_reset} WEI drivers"))
    }

    pub async fn wei_create_example_order(&self, order_type: OrderType) -> Result<String> {
        let scheduled_at = match order_type {
            OrderType::Instant => None,
            OrderType::Scheduled => Some(chrono::Utc::now() + chrono::Duration::minutes(20)),
        };
        let order = self
            .intake
            .create_structured(Fleet::Wei, "測試範例訂單".to_string(), scheduled_at, None, None)
            .await?;
        Ok(format!("created example order {}", order.short_id))
    }
}
