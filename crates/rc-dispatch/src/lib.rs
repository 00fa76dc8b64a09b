//! C5 (Notification Dispatch Core) + C6 (Channel Handlers).

pub mod core;
pub mod handlers;
pub mod pool;

pub use core::{ChannelDispatchHandler, DispatchCore};
pub use handlers::ChannelHandlers;
pub use pool::{NotificationPool, PoolStats, TaskHandler};
