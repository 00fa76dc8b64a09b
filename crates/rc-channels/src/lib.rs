//! C4: translates an `(Order, Event, DriverContext)` tuple into a
//! platform-specific update for each of the three channels.

pub mod capability;
mod card;
mod footer;
mod msg;
pub mod reply_text;
pub mod sse;

pub use capability::{
    CardEmbed, CardMessenger, CardReplier, CardUpdater, ChatPlatformClient,
    MessagingPlatformClient, MsgUpdater, SseBroadcaster,
};
pub use card::CardAdapter;
pub use msg::MsgAdapter;
pub use sse::{SseEnvelope, SseHub, SsePage};
