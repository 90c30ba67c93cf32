//! Value types shared across the hawser workspace.
//!
//! Everything in this crate is plain data: no I/O beyond reading the process environment in
//! [`Config::from_env`], no runtime, no shared state.
#![warn(missing_docs)]

mod config;
/// Exact decimal arithmetic for prices and quantities.
pub mod decimal;
mod enums;
mod error;

pub use config::{Config, DEFAULT_HTTP_URL, DEFAULT_TRADE_WS_URL};
pub use decimal::Decimal;
pub use enums::{
    BoundaryEnum, Language, Market, OrderSide, OrderStatus, OrderTag, OrderType, Period,
    TopicType, TradeStatus, TriggerStatus,
};
pub use error::{ErrorKind, HawserError};

/// Derive macro generating [`BoundaryEnum`] from one variant table.
pub use hawser_macros::BoundaryEnum;

/// Result alias used throughout the workspace.
pub type Result<T, E = HawserError> = std::result::Result<T, E>;
