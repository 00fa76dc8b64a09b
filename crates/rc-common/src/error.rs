use thiserror::Error;

/// Crate-wide error taxonomy. One flat enum per the spec's error handling design,
/// in the shape of the reference workspace's `FlowCatalystError`/`RouterError`.
#[derive(Error, Debug)]
pub enum RcError {
    #[error("illegal status transition: {from:?} -> {to:?} for order {order_id}")]
    IllegalTransition {
        order_id: String,
        from: String,
        to: String,
    },

    #[error("order not found: {0}")]
    OrderNotFound(String),

    #[error("driver not found: {0}")]
    DriverNotFound(String),

    #[error("stale card coordinates for order {0}")]
    StaleCardCoordinates(String),

    #[error("external channel failure: {0}")]
    ExternalChannel(String),

    #[error("notification queue full")]
    QueueFull,

    #[error("worker panicked: {0}")]
    Panic(String),

    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("bus error: {0}")]
    Bus(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("could not parse order text: {0}")]
    ParseError(String),
}

pub type Result<T> = std::result::Result<T, RcError>;
