use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::oneshot;

use crate::convert::PushOrderChanged;
use crate::dispatch::{OrderChangedHandler, PushDispatcher};
use crate::stream::PushTask;
use crate::transport::{PushReceiver, TradeBackend, TradeConnection};
use hawser_types::{Config, HawserError, TopicType};

/// An authenticated trading connection.
///
/// Cloning is cheap and shares the connection; the connection is closed by [`shutdown`] or when
/// the last clone is dropped. The push task only holds a weak reference to the dispatcher, so it
/// never keeps a session alive.
///
/// [`shutdown`]: TradeSession::shutdown
#[derive(Clone)]
pub struct TradeSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: Arc<Config>,
    connection: Arc<dyn TradeConnection>,
    dispatcher: Arc<PushDispatcher>,
    push_task: Mutex<Option<PushTask>>,
    closed: AtomicBool,
}

impl TradeSession {
    /// Validate `config`, connect through `backend` and start delivering push events.
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    /// Configuration errors from [`Config::validate`], or whatever the backend reports.
    pub async fn connect(
        backend: &dyn TradeBackend,
        config: Arc<Config>,
    ) -> Result<Self, HawserError> {
        config.validate()?;
        let (connection, events) = backend.connect(Arc::clone(&config)).await?;

        let dispatcher = Arc::new(PushDispatcher::default());
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(run_push_loop(Arc::downgrade(&dispatcher), events, stop_rx));

        #[cfg(feature = "tracing")]
        tracing::info!(endpoint = config.trade_ws_endpoint(), "trade session connected");

        Ok(Self {
            inner: Arc::new(SessionInner {
                config,
                connection,
                dispatcher,
                push_task: Mutex::new(Some(PushTask::new(task, stop_tx))),
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Configuration this session was created with.
    #[must_use]
    pub fn config(&self) -> &Arc<Config> {
        &self.inner.config
    }

    /// Subscribe to `topics`.
    ///
    /// # Errors
    /// `SessionClosed` after [`TradeSession::shutdown`], otherwise the backend's error. A failed
    /// call leaves the subscription state unchanged.
    pub async fn subscribe(&self, topics: &[TopicType]) -> Result<(), HawserError> {
        self.ensure_open()?;
        self.inner.connection.subscribe(topics).await
    }

    /// Unsubscribe from `topics`.
    ///
    /// # Errors
    /// Same as [`TradeSession::subscribe`].
    pub async fn unsubscribe(&self, topics: &[TopicType]) -> Result<(), HawserError> {
        self.ensure_open()?;
        self.inner.connection.unsubscribe(topics).await
    }

    /// Register the order-changed handler, replacing any previous one. `None` clears it.
    pub fn set_on_order_changed<F>(&self, handler: Option<F>)
    where
        F: Fn(&PushOrderChanged) + Send + Sync + 'static,
    {
        self.replace_handler(handler.map(|f| Arc::new(f) as OrderChangedHandler));
    }

    /// Same as [`TradeSession::set_on_order_changed`] for an already shared handler.
    pub fn replace_handler(&self, handler: Option<OrderChangedHandler>) {
        if self.is_closed() {
            return;
        }
        let previous = self.inner.dispatcher.set_on_order_changed(handler);
        #[cfg(feature = "tracing")]
        {
            if previous.is_some() {
                tracing::debug!("order-changed handler replaced");
            }
        }
        drop(previous);
    }

    /// Close the connection. Idempotent.
    ///
    /// The handler is cleared, the push task is stopped and the backend connection is closed, in
    /// that order, before this returns.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }

    /// `true` after [`TradeSession::shutdown`].
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), HawserError> {
        if self.is_closed() {
            Err(HawserError::SessionClosed)
        } else {
            Ok(())
        }
    }
}

impl SessionInner {
    fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        drop(self.dispatcher.set_on_order_changed(None));
        if let Ok(mut slot) = self.push_task.lock() {
            drop(slot.take());
        }
        self.connection.close();

        #[cfg(feature = "tracing")]
        tracing::info!(endpoint = self.config.trade_ws_endpoint(), "trade session closed");
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for TradeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TradeSession")
            .field("config", &self.inner.config)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

async fn run_push_loop(
    dispatcher: Weak<PushDispatcher>,
    mut events: PushReceiver,
    mut stop_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            _ = &mut stop_rx => break,
            event = events.recv() => {
                let Some(event) = event else { break };
                let Some(dispatcher) = dispatcher.upgrade() else { break };
                let _outcome = dispatcher.dispatch(event);
            }
        }
    }
    #[cfg(feature = "tracing")]
    tracing::debug!("push task exited");
}
