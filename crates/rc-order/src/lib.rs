//! C2 (order/driver repository) + C3 (order state machine).

pub mod capability;
mod repository;
mod short_id;
mod state_machine;

pub use capability::{DistanceEstimator, NotificationSink};
pub use repository::{DriverRepository, OrderRepository};
pub use short_id::ShortIdGenerator;
pub use state_machine::OrderStateMachine;
