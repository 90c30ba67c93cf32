//! hawser-core
//!
//! Session plumbing and boundary conversions shared by the hawser facade and its mocks.
//!
//! - `convert`: boundary records (integer tags, optional decimals, unix timestamps) and their
//!   total conversions to and from the rich event types.
//! - `transport`: the collaborator traits a trading backend and an HTTP transport implement.
//! - `session`: `TradeSession`, an automatically shared, authenticated connection.
//! - `dispatch`: the per-session push dispatcher.
//! - `stream`: push task lifecycle helpers.
//!
//! Async runtime (Tokio)
//! ---------------------
//! Sessions spawn their push task with `tokio::spawn` and receive backend events over a
//! `tokio::sync::mpsc` channel, so `TradeSession::connect` must run inside a Tokio 1.x runtime.
//!
#![warn(missing_docs)]

/// Boundary records and conversions to rich types.
pub mod convert;
/// Push event dispatch.
pub mod dispatch;
/// The automatically shared trading session.
pub mod session;
/// Push task lifecycle utilities.
pub mod stream;
/// Backend and HTTP collaborator traits.
pub mod transport;

pub use convert::{
    PushEvent, PushOrderChanged, RawDate, RawDateTime, RawDecimal, RawOrderChanged, RawPushEvent,
    RawTime,
};
pub use dispatch::{DispatchOutcome, OrderChangedHandler, PushDispatcher};
pub use session::TradeSession;
pub use transport::{HttpMethod, HttpTransport, PushReceiver, RawRequest, TradeBackend, TradeConnection};

pub use hawser_types::*;
