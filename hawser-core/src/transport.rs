use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::convert::RawPushEvent;
use hawser_types::{Config, HawserError, TopicType};

/// Receiving half of a connection's push event channel.
pub type PushReceiver = mpsc::UnboundedReceiver<RawPushEvent>;

/// A trading backend able to open authenticated connections.
///
/// The network layer behind this trait owns its own worker threads; hawser only awaits it.
#[async_trait]
pub trait TradeBackend: Send + Sync {
    /// Authenticate with `config` and open a connection.
    ///
    /// Returns the connection and the channel its push events arrive on. The channel closes
    /// when the connection is closed.
    async fn connect(
        &self,
        config: Arc<Config>,
    ) -> Result<(Arc<dyn TradeConnection>, PushReceiver), HawserError>;
}

/// One live backend connection.
#[async_trait]
pub trait TradeConnection: Send + Sync {
    /// Subscribe to `topics`. On failure the subscription state is unchanged.
    async fn subscribe(&self, topics: &[TopicType]) -> Result<(), HawserError>;

    /// Unsubscribe from `topics`. On failure the subscription state is unchanged.
    async fn unsubscribe(&self, topics: &[TopicType]) -> Result<(), HawserError>;

    /// Close the connection and drop every subscription. Must not block.
    fn close(&self);
}

/// HTTP verb of a raw request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// PATCH
    Patch,
}

impl HttpMethod {
    /// Canonical upper-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = HawserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::Get,
            Self::Post,
            Self::Put,
            Self::Delete,
            Self::Patch,
        ]
        .into_iter()
        .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| HawserError::invalid_format(format!("unsupported http method `{s}`")))
    }
}

/// A request passed through to the HTTP API without interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRequest {
    /// Verb.
    pub method: HttpMethod,
    /// Path relative to the configured HTTP endpoint, e.g. `/v1/trade/order/today`.
    pub path: String,
    /// Extra headers, in order.
    pub headers: Vec<(String, String)>,
    /// Body, usually JSON.
    pub body: Option<String>,
}

impl RawRequest {
    /// Build a request with no headers and no body.
    ///
    /// # Errors
    /// `InvalidFormat` if `path` does not start with `/`.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Result<Self, HawserError> {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(HawserError::invalid_format(format!(
                "request path `{path}` must start with `/`"
            )));
        }
        Ok(Self {
            method,
            path,
            headers: Vec::new(),
            body: None,
        })
    }

    /// Append a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Executes raw HTTP requests against the API.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Execute `request` with the credentials and endpoint of `config`, returning the body.
    async fn request(&self, config: &Config, request: RawRequest) -> Result<String, HawserError>;
}
