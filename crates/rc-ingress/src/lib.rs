//! C8: admits new orders and wires driver-initiated actions into C3.

pub mod commands;
pub mod driver_actions;
pub mod orders;
pub mod reply_resolve;
pub mod text_parse;

pub use commands::{SearchScheduledFilter, SlashCommands};
pub use driver_actions::DriverActions;
pub use orders::OrderIntake;
pub use reply_resolve::resolve_reply;

use rc_bus::EventBus;
use rc_common::Result;

/// De-duplicates chat-platform message-create events across instances
/// (spec.md §4.4): returns `false` if `message_id` was already seen within
/// the TTL window, meaning the caller should drop this occurrence.
pub async fn admit_inbound_message(bus: &EventBus, message_id: &str, ttl_secs: u64) -> Result<bool> {
    bus.try_mark_processed(message_id, ttl_secs)
        .await
        .map_err(|e| rc_common::RcError::Bus(e.to_string()))
}
