//! Shared types for the order lifecycle & notification core.
//!
//! Mirrors fc-common's role in the reference workspace: the one crate every
//! other crate depends on for wire types, the error taxonomy, and logging
//! setup.

pub mod error;
pub mod event;
pub mod logging;
pub mod model;

pub use error::{RcError, Result};
pub use event::{DispatchPolicy, NotificationTask, NotifyChannel, NotifyEvent, OrderStatusEvent, UiUpdateEvent};
pub use model::{
    Driver, DriverBinding, DriverStatus, Fleet, MsgAnchor, Order, OrderId, OrderStatus,
    OrderType, ShortId,
};
