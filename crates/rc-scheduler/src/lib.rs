//! C7: periodically scans scheduled orders and triggers the T-30 conversion
//! in C3 (spec.md §4.2/§2), grounded on the reference `DispatchScheduler`'s
//! poll loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rc_order::OrderStateMachine;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub poll_interval: Duration,
    pub activation_window: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval: Duration::from_millis(15_000),
            activation_window: Duration::from_secs(30 * 60),
        }
    }
}

/// A plain `AtomicBool` is enough here: the only shared decision is "still
/// running", read-mostly from one background task and written from `stop`.
pub struct ActivationScheduler {
    config: SchedulerConfig,
    state_machine: Arc<OrderStateMachine>,
    orders: Arc<rc_order::OrderRepository>,
    running: Arc<AtomicBool>,
}

impl ActivationScheduler {
    pub fn new(config: SchedulerConfig, orders: Arc<rc_order::OrderRepository>, state_machine: Arc<OrderStateMachine>) -> Self {
        Self {
            config,
            state_machine,
            orders,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn start(&self) {
        if !self.config.enabled {
            info!("activation scheduler disabled");
            return;
        }
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("activation scheduler already running");
            return;
        }

        info!(poll_interval_ms = self.config.poll_interval.as_millis(), "starting activation scheduler");

        let orders = self.orders.clone();
        let state_machine = self.state_machine.clone();
        let running = self.running.clone();
        let poll_interval = self.config.poll_interval;
        let activation_window = self.config.activation_window;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            loop {
                interval.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                if let Err(e) = tick(&orders, &state_machine, activation_window).await {
                    error!(error = %e, "activation scheduler tick failed");
                }
            }
        });
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        info!("activation scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

async fn tick(
    orders: &rc_order::OrderRepository,
    state_machine: &OrderStateMachine,
    activation_window: Duration,
) -> rc_common::Result<()> {
    let window_end = Utc::now() + chrono::Duration::from_std(activation_window).unwrap_or_default();
    let due = orders.find_scheduled_due_for_activation(window_end).await?;

    if due.is_empty() {
        return Ok(());
    }

    debug!(count = due.len(), "found scheduled orders due for activation");
    metrics::gauge!("scheduler.due_orders").set(due.len() as f64);

    for order in due {
        match state_machine.activate_scheduled(&order.order_id).await {
            Ok(_) => {
                metrics::counter!("scheduler.activations_total").increment(1);
            }
            Err(e) => {
                // Another tick or a manual accept may have already moved the
                // order; the CAS failure is expected and logged, not fatal.
                warn!(order_id = %order.order_id, error = %e, "activation skipped");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_window() {
        let config = SchedulerConfig::default();
        assert_eq!(config.activation_window, Duration::from_secs(30 * 60));
    }
}
