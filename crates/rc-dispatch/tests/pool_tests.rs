//! NotificationPool back-pressure and panic-recovery tests (spec.md §8:
//! "queue-full-critical-blocks", "queue-full-noncritical-drops",
//! "worker-panic-respawn").

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rc_common::{DispatchPolicy, NotifyChannel, NotifyEvent, NotificationTask, OrderId};
use rc_dispatch::{NotificationPool, TaskHandler};
use tokio::sync::Notify;

fn task(order_id: &str, policy: DispatchPolicy) -> NotificationTask {
    NotificationTask {
        channel: NotifyChannel::Sse,
        order_id: OrderId(order_id.to_string()),
        order: None,
        driver: None,
        event: NotifyEvent::DriverAccepted,
        distance_km: None,
        estimated_mins: None,
        policy,
    }
}

struct NoopHandler;

#[async_trait]
impl TaskHandler for NoopHandler {
    async fn handle(&self, _task: NotificationTask) {}
}

#[tokio::test]
async fn queue_full_drop_policy_sheds_load() {
    // Never started, so nothing drains the queue and capacity stays exactly 2.
    let pool = NotificationPool::new(1, 2, Arc::new(NoopHandler));

    pool.enqueue(task("a", DispatchPolicy::Block)).await;
    pool.enqueue(task("b", DispatchPolicy::Block)).await;

    pool.enqueue(task("c", DispatchPolicy::Drop)).await;

    let stats = pool.stats();
    assert_eq!(stats.dropped, 1);
    assert_eq!(stats.queued, 2);
}

#[tokio::test]
async fn queue_full_block_policy_blocks_the_caller() {
    let pool = NotificationPool::new(1, 1, Arc::new(NoopHandler));

    pool.enqueue(task("a", DispatchPolicy::Block)).await;

    let blocked = {
        let pool = pool.clone();
        tokio::spawn(async move {
            pool.enqueue(task("b", DispatchPolicy::Block)).await;
        })
    };

    // With nothing draining the queue, the blocked enqueue must not resolve.
    let result = tokio::time::timeout(Duration::from_millis(150), blocked).await;
    assert!(result.is_err(), "Block-policy enqueue must wait for queue space, not shed load");

    assert_eq!(pool.stats().dropped, 0);
}

struct PanicOnceHandler {
    panicked: AtomicU32,
    handled: Arc<Notify>,
}

#[async_trait]
impl TaskHandler for PanicOnceHandler {
    async fn handle(&self, task: NotificationTask) {
        if task.order_id.as_str() == "boom" && self.panicked.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("simulated worker panic");
        }
        self.handled.notify_one();
    }
}

#[tokio::test]
async fn worker_panic_is_recovered_by_respawn() {
    let handled = Arc::new(Notify::new());
    let handler = Arc::new(PanicOnceHandler {
        panicked: AtomicU32::new(0),
        handled: handled.clone(),
    });

    let pool = NotificationPool::new(1, 8, handler);
    pool.start();

    pool.enqueue(task("boom", DispatchPolicy::Block)).await;
    // Give the supervisor time to notice the panic and respawn the worker.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(pool.stats().active_workers, 1, "pool must keep exactly one live worker after a panic");

    pool.enqueue(task("ok", DispatchPolicy::Block)).await;
    tokio::time::timeout(Duration::from_secs(1), handled.notified())
        .await
        .expect("respawned worker must still process subsequent tasks");
}
