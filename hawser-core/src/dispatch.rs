use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};

use crate::convert::{PushEvent, PushOrderChanged, RawPushEvent};
use hawser_types::HawserError;

/// Persistent order-changed callback.
pub type OrderChangedHandler = Arc<dyn Fn(&PushOrderChanged) + Send + Sync>;

/// What happened to one raw push event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Converted and handed to the registered handler.
    Delivered,
    /// Converted, but no handler was registered.
    NoHandler,
    /// Conversion failed; the event was dropped.
    Rejected(HawserError),
    /// The handler panicked; the dispatcher keeps running.
    HandlerPanicked,
}

/// Routes converted push events to the handler registered for one session.
///
/// The dispatcher itself does not serialize anything: callers feed it from a single task, which
/// is what keeps deliveries for one session from overlapping.
#[derive(Default)]
pub struct PushDispatcher {
    on_order_changed: Mutex<Option<OrderChangedHandler>>,
}

impl PushDispatcher {
    /// Register `handler`, replacing and returning the previous one.
    ///
    /// `None` clears the registration. A delivery already running keeps its own reference to the
    /// previous handler, so it is dropped once that delivery returns.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn set_on_order_changed(
        &self,
        handler: Option<OrderChangedHandler>,
    ) -> Option<OrderChangedHandler> {
        let mut slot = self.on_order_changed.lock().expect("mutex poisoned");
        std::mem::replace(&mut *slot, handler)
    }

    /// `true` if an order-changed handler is registered.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn has_handler(&self) -> bool {
        self.on_order_changed
            .lock()
            .expect("mutex poisoned")
            .is_some()
    }

    /// Convert `event` and deliver it.
    ///
    /// Events that fail conversion are never forwarded; an unknown tag here means the backend is
    /// newer than this client.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn dispatch(&self, event: RawPushEvent) -> DispatchOutcome {
        let event = match PushEvent::try_from(event) {
            Ok(event) => event,
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %err, "dropping push event that failed conversion");
                return DispatchOutcome::Rejected(err);
            }
        };

        match event {
            PushEvent::OrderChanged(order) => {
                let handler = self.on_order_changed.lock().expect("mutex poisoned").clone();
                let Some(handler) = handler else {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        order_id = %order.order_id,
                        "no order-changed handler registered; event dropped"
                    );
                    return DispatchOutcome::NoHandler;
                };
                match catch_unwind(AssertUnwindSafe(|| handler(&order))) {
                    Ok(()) => DispatchOutcome::Delivered,
                    Err(_) => {
                        #[cfg(feature = "tracing")]
                        tracing::error!(order_id = %order.order_id, "order-changed handler panicked");
                        DispatchOutcome::HandlerPanicked
                    }
                }
            }
        }
    }
}

impl fmt::Debug for PushDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushDispatcher")
            .field("has_handler", &self.has_handler())
            .finish()
    }
}
