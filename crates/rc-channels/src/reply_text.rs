//! Bit-exact banner-reply formatting rules (spec.md §4.6).
//!
//! These are pure functions so the formatting can be tested without any
//! platform SDK in the loop. Preserve the lookup tables as-is — UI compatibility
//! depends on the exact Chinese strings.

use rc_common::{Fleet, NotifyEvent, OrderType, ShortId};

/// `carInfo = CarColor == "" ? CarPlate : CarPlate + "(" + CarColor + ")"`.
pub fn car_info(car_plate: &str, car_color: &str) -> String {
    if car_color.is_empty() {
        car_plate.to_string()
    } else {
        format!("{car_plate}({car_color})")
    }
}

/// Chinese display name for each event, keyed by the event enum.
pub fn event_name(event: NotifyEvent) -> &'static str {
    match event {
        NotifyEvent::DriverAccepted => "司機接單",
        NotifyEvent::ScheduledActivated => "司機接單",
        NotifyEvent::ScheduledAccepted => "預約成立",
        NotifyEvent::DriverArrived => "司機抵達",
        NotifyEvent::CustomerOnBoard => "乘客上車",
        NotifyEvent::OrderCompleted => "行程結束",
        NotifyEvent::OrderCancelled => "訂單取消",
        NotifyEvent::OrderFailed => "訂單失敗",
        NotifyEvent::ScheduledWaiting => "預約單建立",
        NotifyEvent::OrderConverted => "預約單轉換",
        NotifyEvent::ConversionMessage => "預約單轉換",
        NotifyEvent::DriverRejected => "司機婉拒",
        NotifyEvent::DriverTimeout => "司機逾時",
    }
}

/// Embed accent colour per event, parallel to [`event_name`] (spec.md §4.6).
pub fn event_color(event: NotifyEvent) -> u32 {
    match event {
        NotifyEvent::DriverAccepted | NotifyEvent::ScheduledActivated => 0x2ECC71,
        NotifyEvent::ScheduledAccepted | NotifyEvent::ScheduledWaiting => 0x3498DB,
        NotifyEvent::DriverArrived => 0xF1C40F,
        NotifyEvent::CustomerOnBoard => 0x1ABC9C,
        NotifyEvent::OrderCompleted => 0x2980B9,
        NotifyEvent::OrderCancelled | NotifyEvent::OrderFailed => 0xE74C3C,
        NotifyEvent::OrderConverted | NotifyEvent::ConversionMessage => 0x9B59B6,
        NotifyEvent::DriverRejected | NotifyEvent::DriverTimeout => 0x95A5A6,
    }
}

/// Parameters needed to render a banner reply. `distance_km`/`estimated_mins`
/// are only consulted for `DriverAccepted` and `ScheduledActivated`.
pub struct ReplyTextInput<'a> {
    pub fleet: Fleet,
    pub short_id: &'a ShortId,
    pub order_type: OrderType,
    pub event: NotifyEvent,
    pub ori_text: &'a str,
    pub car_plate: &'a str,
    pub car_color: &'a str,
    pub driver_name: &'a str,
    pub distance_km: Option<f64>,
    pub estimated_mins: Option<i64>,
}

/// Renders the banner-reply text per the four cases of spec.md §4.6.
pub fn render(input: &ReplyTextInput<'_>) -> String {
    if matches!(
        input.event,
        NotifyEvent::OrderFailed | NotifyEvent::ConversionMessage | NotifyEvent::ScheduledWaiting
    ) {
        return format!(
            "【{}{}－{}】: {}",
            input.fleet,
            input.short_id,
            event_name(input.event),
            input.ori_text
        );
    }

    let car_info = car_info(input.car_plate, input.car_color);
    let name = event_name(input.event);

    let carries_distance = matches!(
        input.event,
        NotifyEvent::DriverAccepted | NotifyEvent::ScheduledActivated
    );

    match (input.order_type, carries_distance) {
        (OrderType::Instant, true) => format!(
            "【{}{}－{}】: {} | {} | {} | {:.1}km({}分)",
            input.fleet,
            input.short_id,
            name,
            input.ori_text,
            car_info,
            input.driver_name,
            input.distance_km.unwrap_or_default(),
            input.estimated_mins.unwrap_or_default(),
        ),
        (OrderType::Instant, false) => format!(
            "【{}{}－{}】: {} | {} | {}",
            input.fleet, input.short_id, name, input.ori_text, car_info, input.driver_name,
        ),
        (OrderType::Scheduled, true) => format!(
            "【{}{}－{}】: 預約單 | {} | {} | {} | {:.1}km({}分)",
            input.fleet,
            input.short_id,
            name,
            input.ori_text,
            car_info,
            input.driver_name,
            input.distance_km.unwrap_or_default(),
            input.estimated_mins.unwrap_or_default(),
        ),
        (OrderType::Scheduled, false) => format!(
            "【{}{}－{}】: 預約單 | {} | {} | {}",
            input.fleet, input.short_id, name, input.ori_text, car_info, input.driver_name,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn car_info_omits_empty_color() {
        assert_eq!(car_info("ABC-123", ""), "ABC-123");
        assert_eq!(car_info("ABC-123", "白"), "ABC-123(白)");
    }

    /// spec.md §8's pinned example, bit-exact.
    #[test]
    fn instant_driver_accepted_matches_spec_example() {
        let short_id = ShortId("#42".to_string());
        let input = ReplyTextInput {
            fleet: Fleet::Rsk,
            short_id: &short_id,
            order_type: OrderType::Instant,
            event: NotifyEvent::DriverAccepted,
            ori_text: "台北101",
            car_plate: "ABC-123",
            car_color: "白",
            driver_name: "王五",
            distance_km: Some(2.3),
            estimated_mins: Some(7),
        };

        assert_eq!(
            render(&input),
            "【RSK#42－司機接單】: 台北101 | ABC-123(白) | 王五 | 2.3km(7分)"
        );
    }

    #[test]
    fn order_failed_has_no_car_info() {
        let short_id = ShortId("#7".to_string());
        let input = ReplyTextInput {
            fleet: Fleet::Kd,
            short_id: &short_id,
            order_type: OrderType::Instant,
            event: NotifyEvent::OrderFailed,
            ori_text: "台中火車站",
            car_plate: "",
            car_color: "",
            driver_name: "",
            distance_km: None,
            estimated_mins: None,
        };

        assert_eq!(render(&input), "【KD#7－訂單失敗】: 台中火車站");
    }

    #[test]
    fn scheduled_activated_inserts_prefix() {
        let short_id = ShortId("#99".to_string());
        let input = ReplyTextInput {
            fleet: Fleet::Wei,
            short_id: &short_id,
            order_type: OrderType::Scheduled,
            event: NotifyEvent::ScheduledActivated,
            ori_text: "高鐵站",
            car_plate: "XYZ-999",
            car_color: "黑",
            driver_name: "李四",
            distance_km: Some(1.0),
            estimated_mins: Some(4),
        };

        assert_eq!(
            render(&input),
            "【WEI#99－司機接單】: 預約單 | 高鐵站 | XYZ-999(黑) | 李四 | 1.0km(4分)"
        );
    }

    #[test]
    fn scheduled_other_event_has_no_distance() {
        let short_id = ShortId("#5".to_string());
        let input = ReplyTextInput {
            fleet: Fleet::Rsk,
            short_id: &short_id,
            order_type: OrderType::Scheduled,
            event: NotifyEvent::DriverArrived,
            ori_text: "松山機場",
            car_plate: "DEF-456",
            car_color: "",
            driver_name: "陳六",
            distance_km: None,
            estimated_mins: None,
        };

        assert_eq!(
            render(&input),
            "【RSK#5－司機抵達】: 預約單 | 松山機場 | DEF-456 | 陳六"
        );
    }
}
