//! C5 worker pool: bounded FIFO queue, fixed worker count, panic-safe restart,
//! back-pressure policy decided per task at the enqueue site (spec.md §4.4/§5/§9).
//!
//! Simplified from the reference `ProcessPool`: no per-message-group queues are
//! needed here because C3 already serializes writes per order via its CAS, so
//! cross-channel ordering for a single order is not this pool's job — one flat
//! queue plus a fixed worker count is sufficient (see DESIGN.md).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rc_common::{DispatchPolicy, NotificationTask};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, task: NotificationTask);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PoolStats {
    pub queued: usize,
    pub dropped: u64,
    pub active_workers: u32,
}

pub struct NotificationPool {
    tx: std::sync::Mutex<Option<mpsc::Sender<NotificationTask>>>,
    configured_workers: usize,
    dropped: Arc<AtomicU64>,
    active_workers: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    workers: std::sync::Mutex<Option<JoinSet<()>>>,
    rx_holder: std::sync::Mutex<Option<mpsc::Receiver<NotificationTask>>>,
    handler: Arc<dyn TaskHandler>,
}

impl NotificationPool {
    pub fn new(workers: usize, queue_size: usize, handler: Arc<dyn TaskHandler>) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(queue_size);
        Arc::new(Self {
            tx: std::sync::Mutex::new(Some(tx)),
            configured_workers: workers.max(1),
            dropped: Arc::new(AtomicU64::new(0)),
            active_workers: Arc::new(AtomicU64::new(0)),
            running: Arc::new(AtomicBool::new(false)),
            workers: std::sync::Mutex::new(None),
            rx_holder: std::sync::Mutex::new(Some(rx)),
            handler,
        })
    }

    /// Idempotent with respect to repeated calls (spec.md §5).
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let rx = self
            .rx_holder
            .lock()
            .unwrap()
            .take()
            .expect("start called once per pool instance");

        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let mut join_set = JoinSet::new();

        for worker_id in 0..self.configured_workers {
            self.spawn_worker(&mut join_set, worker_id, rx.clone());
        }

        let pool = self.clone();
        tokio::spawn(async move {
            pool.supervise(join_set, rx).await;
        });

        info!(workers = self.configured_workers, "notification pool started");
    }

    fn spawn_worker(
        self: &Arc<Self>,
        join_set: &mut JoinSet<()>,
        worker_id: usize,
        rx: Arc<tokio::sync::Mutex<mpsc::Receiver<NotificationTask>>>,
    ) {
        let pool = self.clone();
        self.active_workers.fetch_add(1, Ordering::SeqCst);

        join_set.spawn(async move {
            debug!(worker_id, "worker started");
            loop {
                let task = {
                    let mut rx = rx.lock().await;
                    rx.recv().await
                };

                let Some(task) = task else {
                    debug!(worker_id, "queue closed, worker exiting");
                    break;
                };

                let order_id = task.order_id.clone();
                pool.handler.handle(task).await;
                metrics::counter!("dispatch.tasks_handled_total").increment(1);
                debug!(worker_id, %order_id, "task handled");
            }
            pool.active_workers.fetch_sub(1, Ordering::SeqCst);
        });
    }

    /// A worker panic must not crash siblings (spec.md §4.4): notice the dead
    /// slot and respawn within the loop, keeping `len(workers) == configured`.
    async fn supervise(
        self: Arc<Self>,
        mut join_set: JoinSet<()>,
        rx: Arc<tokio::sync::Mutex<mpsc::Receiver<NotificationTask>>>,
    ) {
        let mut next_worker_id = self.configured_workers;
        while self.running.load(Ordering::SeqCst) {
            match join_set.join_next().await {
                Some(Ok(())) => {
                    // Clean exit only happens on queue close (shutdown); nothing to respawn.
                }
                Some(Err(join_err)) => {
                    error!(error = %join_err, "dispatch worker panicked, respawning");
                    self.spawn_worker(&mut join_set, next_worker_id, rx.clone());
                    next_worker_id += 1;
                }
                None => break,
            }
        }
    }

    /// Enqueue per spec.md §4.4: non-blocking if there's room; on a full queue,
    /// `Block` producers wait for space, `Drop` producers shed load with a warning.
    pub async fn enqueue(&self, task: NotificationTask) {
        let Some(tx) = self.tx.lock().unwrap().clone() else {
            error!("notification queue closed on enqueue");
            return;
        };

        match tx.try_send(task) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(task)) => match task.policy {
                DispatchPolicy::Block => {
                    if tx.send(task).await.is_err() {
                        error!("notification queue closed while blocked on enqueue");
                    }
                }
                DispatchPolicy::Drop => {
                    self.dropped.fetch_add(1, Ordering::SeqCst);
                    metrics::counter!("dispatch.tasks_dropped_total").increment(1);
                    warn!(order_id = %task.order_id, channel = ?task.channel, event = ?task.event, "queue full, dropping non-critical notification");
                }
            },
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!("notification queue closed on enqueue");
            }
        }
    }

    pub fn stats(&self) -> PoolStats {
        let queued = self
            .tx
            .lock()
            .unwrap()
            .as_ref()
            .map(|tx| tx.max_capacity() - tx.capacity())
            .unwrap_or(0);
        PoolStats {
            queued,
            dropped: self.dropped.load(Ordering::SeqCst),
            active_workers: self.active_workers.load(Ordering::SeqCst) as u32,
        }
    }

    /// Closes the sentinel and waits up to `timeout` for workers to drain the
    /// current task and exit (spec.md §5).
    pub async fn stop(&self, timeout: Duration) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        // Drop our Sender so every worker's `rx.recv()` returns `None` once any
        // in-flight clones finish, instead of parking forever on an open channel.
        self.tx.lock().unwrap().take();

        let deadline = tokio::time::Instant::now() + timeout;
        while self.active_workers.load(Ordering::SeqCst) > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        if self.active_workers.load(Ordering::SeqCst) > 0 {
            warn!("pool stop timed out with workers still draining");
        } else {
            info!("notification pool stopped");
        }
    }
}
