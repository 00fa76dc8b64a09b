//! Capability interfaces (spec.md §9): the dispatch core depends on the narrow
//! intersection it needs per call site, never on a monolithic "channel service".

use async_trait::async_trait;
use rc_common::{Driver, NotifyEvent, Order, Result};

/// Out-of-scope collaborator (spec.md §1): actual chat-platform SDK calls.
#[async_trait]
pub trait ChatPlatformClient: Send + Sync {
    async fn edit_card(&self, channel_id: &str, message_id: &str, embed: CardEmbed) -> Result<()>;
    async fn send_banner_reply(&self, channel_id: &str, message_id: &str, text: &str, color: u32) -> Result<()>;
    /// Returns the new message id — used for `ConversionMessage`, which sends a
    /// fresh message rather than editing (spec.md §4.4).
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String>;
}

/// Out-of-scope collaborator (spec.md §1): messaging-platform SDK calls.
#[async_trait]
pub trait MessagingPlatformClient: Send + Sync {
    async fn edit_message(&self, message_id: &str, text: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct CardEmbed {
    pub title: String,
    pub description: String,
    pub color: u32,
    /// The footer is always exactly the `OrderID` (spec.md §6).
    pub footer: String,
}

/// Edits the order card in place (Card channel, spec.md §4.4).
#[async_trait]
pub trait CardUpdater: Send + Sync {
    async fn update_card(&self, order: &Order, event: NotifyEvent) -> Result<()>;
}

/// Edits previously-sent messaging-platform messages (Msg channel).
#[async_trait]
pub trait MsgUpdater: Send + Sync {
    async fn update_msg(&self, order: &Order, event: NotifyEvent) -> Result<()>;
}

/// Sends the threaded banner reply under the card (spec.md §4.6).
#[async_trait]
pub trait CardReplier: Send + Sync {
    async fn reply_banner(
        &self,
        order: &Order,
        driver: Option<&Driver>,
        event: NotifyEvent,
        distance_km: Option<f64>,
        estimated_mins: Option<i64>,
    ) -> Result<()>;
}

/// Sends a fresh card message instead of editing (`ConversionMessage`).
#[async_trait]
pub trait CardMessenger: Send + Sync {
    async fn send_conversion_message(&self, order: &Order) -> Result<()>;
}

/// Fans an SSE envelope out to connected dashboard pages (Sse channel).
pub trait SseBroadcaster: Send + Sync {
    fn broadcast(&self, envelope: crate::sse::SseEnvelope);
}
