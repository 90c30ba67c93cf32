//! Deterministic stand-ins for the trading backend and the HTTP API.
//!
//! Both mocks come with a controller that tests keep on their side to script results, push
//! events into live sessions and inspect what the client did.

mod backend;
pub mod fixtures;
mod http;

pub use backend::{DynamicMockBackend, MockBehavior, MockController};
pub use http::{MockHttpController, MockHttpTransport};
