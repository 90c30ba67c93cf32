//! hawser is the boundary layer of a trading client.
//!
//! Overview
//! - Sessions are exposed as opaque, reference-counted [`SessionHandle`]s with explicit
//!   `retain`/`release`. The last release tears the session down synchronously.
//! - Every operation that talks to the backend (`create`, `subscribe`, `unsubscribe`,
//!   `http_request`) returns immediately and reports through exactly one callback carrying an
//!   [`AsyncResult`].
//! - Server-pushed order changes reach a persistent per-handle callback, one event at a time.
//! - Prices and quantities are exact [`Decimal`] values.
//!
//! Callbacks run on runtime worker threads, never on the calling thread. Async callbacks and
//! push callbacks for the same handle are not ordered with respect to each other.
//!
//! Example
//! ```rust,ignore
//! use hawser::{Config, Hawser, TopicType, UserData};
//!
//! let (backend, _ctl) = hawser_mock::DynamicMockBackend::new_with_controller();
//! let hawser = Hawser::builder().backend(backend).build()?;
//! let h2 = hawser.clone();
//! hawser.create(Config::from_env()?, move |res| {
//!     let Some(handle) = res.handle() else { return };
//!     h2.set_on_order_changed(handle, |_, ev, _| println!("{} {}", ev.symbol, ev.status), UserData::none());
//!     h2.subscribe(handle, &[TopicType::Private], |res| assert!(res.is_ok()), UserData::none());
//! }, UserData::none());
//! ```
//!
//! See `hawser/examples/` for a runnable demonstration against the mock backend.
#![warn(missing_docs)]

/// One-shot async completion.
pub mod bridge;
pub(crate) mod core;
mod handle;
mod userdata;

pub use bridge::{AsyncResult, Completion, Payload};
pub use crate::core::{Hawser, HawserBuilder};
pub use handle::{FreeUserDataFn, SessionHandle};
pub use userdata::{Opaque, UserData};

// Re-export core types for convenience
pub use hawser_core::{
    BoundaryEnum,
    Config,
    Decimal,
    ErrorKind,
    HawserError,
    HttpMethod,
    HttpTransport,
    Language,
    Market,
    OrderSide,
    OrderStatus,
    OrderTag,
    OrderType,
    Period,
    PushEvent,
    PushOrderChanged,
    RawOrderChanged,
    RawPushEvent,
    TopicType,
    TradeBackend,
    TradeConnection,
    TradeStatus,
    TriggerStatus,
};
pub use hawser_types::decimal;
