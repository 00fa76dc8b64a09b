//! DispatchCore channel-targeting tests (spec.md §4.3's event/channel table,
//! §4.4's "only Sse is best-effort" rule).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rc_common::{
    Driver, DriverBinding, DriverStatus, Fleet, NotificationTask, NotifyChannel, Order, OrderId,
    OrderStatus, OrderType, ShortId,
};
use rc_dispatch::{DispatchCore, NotificationPool, TaskHandler};
use rc_order::NotificationSink;

fn sample_order() -> Order {
    let now = Utc::now();
    Order {
        order_id: OrderId("507f1f77bcf86cd799439011".to_string()),
        short_id: ShortId("#1".to_string()),
        order_type: OrderType::Instant,
        status: OrderStatus::Enroute,
        ori_text: "W0/638台灣雲林縣麥寮鄉中山路103號".to_string(),
        fleet: Fleet::Wei,
        customer_group: None,
        passenger_id: None,
        converted_from: None,
        scheduled_at: None,
        driver: DriverBinding::default(),
        card_channel_id: Some("chan-1".to_string()),
        card_message_id: Some("msg-1".to_string()),
        msg_messages: Vec::new(),
        pickup_certificate_url: None,
        is_photo_taken: false,
        created_at: now,
        updated_at: now,
    }
}

fn sample_driver() -> Driver {
    Driver {
        driver_id: "driver-1".to_string(),
        name: "Driver One".to_string(),
        car_plate: "ABC-123".to_string(),
        car_color: "blue".to_string(),
        car_model: "Corolla".to_string(),
        jko_account: None,
        driver_no: "001".to_string(),
        account: "driver1".to_string(),
        fleet: Fleet::Wei,
        status: DriverStatus::Busy,
        current_order_id: None,
        current_order_schedule_id: None,
        fcm_token: None,
    }
}

struct RecordingHandler {
    tasks: Mutex<Vec<NotificationTask>>,
}

#[async_trait]
impl TaskHandler for RecordingHandler {
    async fn handle(&self, task: NotificationTask) {
        self.tasks.lock().unwrap().push(task);
    }
}

async fn drain(pool: &Arc<NotificationPool>, expected: usize) {
    for _ in 0..20 {
        if pool.stats().queued == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let _ = expected;
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test]
async fn order_accepted_fans_out_to_all_three_channels() {
    let recorder = Arc::new(RecordingHandler { tasks: Mutex::new(Vec::new()) });
    let pool = NotificationPool::new(2, 16, recorder.clone());
    pool.start();
    let core = DispatchCore::new(pool.clone());

    core.notify_order_accepted(&sample_order(), &sample_driver(), 3.4, 7).await;
    drain(&pool, 3).await;

    let tasks = recorder.tasks.lock().unwrap();
    let mut channels: Vec<_> = tasks.iter().map(|t| t.channel).collect();
    channels.sort_by_key(|c| format!("{c:?}"));
    assert_eq!(channels, vec![NotifyChannel::Card, NotifyChannel::Msg, NotifyChannel::Sse]);
    assert!(tasks.iter().all(|t| t.order.is_some() && t.driver.is_some()));
}

#[tokio::test]
async fn order_rejected_only_targets_sse_with_no_order_snapshot() {
    let recorder = Arc::new(RecordingHandler { tasks: Mutex::new(Vec::new()) });
    let pool = NotificationPool::new(2, 16, recorder.clone());
    pool.start();
    let core = DispatchCore::new(pool.clone());

    core.notify_order_rejected(&sample_order().order_id, &sample_driver(), 1.1, 3).await;
    drain(&pool, 1).await;

    let tasks = recorder.tasks.lock().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].channel, NotifyChannel::Sse);
    assert!(tasks[0].order.is_none());
    assert!(tasks[0].driver.is_some());
}

#[tokio::test]
async fn order_cancelled_never_reaches_sse() {
    let recorder = Arc::new(RecordingHandler { tasks: Mutex::new(Vec::new()) });
    let pool = NotificationPool::new(2, 16, recorder.clone());
    pool.start();
    let core = DispatchCore::new(pool.clone());

    core.notify_order_cancelled(&sample_order(), "customer request").await;
    drain(&pool, 2).await;

    let tasks = recorder.tasks.lock().unwrap();
    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().all(|t| t.channel != NotifyChannel::Sse));
}
