use std::any::Any;
use std::sync::Arc;

use tokio::runtime::Handle;

use hawser_core::{
    Config, HawserError, HttpMethod, HttpTransport, PushOrderChanged, RawRequest, TopicType,
    TradeBackend, TradeSession,
};

use crate::bridge::{AsyncResult, Completion, execute_async, global_runtime};
use crate::handle::{FreeUserDataFn, HandleRegistry, SessionHandle, teardown};
use crate::userdata::UserData;

/// Boundary facade: explicit handle lifecycle and callback-based operations.
///
/// Cloning is cheap; clones share the same handles, so a clone can be moved into callbacks.
#[derive(Clone)]
pub struct Hawser {
    inner: Arc<HawserInner>,
}

struct HawserInner {
    backend: Arc<dyn TradeBackend>,
    http: Option<Arc<dyn HttpTransport>>,
    runtime: Handle,
    registry: HandleRegistry,
}

/// Builder for [`Hawser`].
#[derive(Default)]
pub struct HawserBuilder {
    backend: Option<Arc<dyn TradeBackend>>,
    http: Option<Arc<dyn HttpTransport>>,
    runtime: Option<Handle>,
}

impl HawserBuilder {
    /// Create a new builder with no backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trading backend sessions connect through. Required.
    #[must_use]
    pub fn backend(mut self, backend: Arc<dyn TradeBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Transport for [`Hawser::http_request`]. Without one, raw requests fail.
    #[must_use]
    pub fn http_transport(mut self, http: Arc<dyn HttpTransport>) -> Self {
        self.http = Some(http);
        self
    }

    /// Runtime operations and their callbacks run on.
    ///
    /// Default: a process-wide multi-thread runtime started on first use.
    #[must_use]
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the facade.
    ///
    /// # Errors
    /// `InvalidConfig` if no backend was set, `Internal` if the default runtime cannot start.
    pub fn build(self) -> Result<Hawser, HawserError> {
        let backend = self.backend.ok_or_else(|| {
            HawserError::invalid_config("no trade backend; set one via backend(...)")
        })?;
        let runtime = match self.runtime {
            Some(rt) => rt,
            None => global_runtime()?,
        };
        Ok(Hawser {
            inner: Arc::new(HawserInner {
                backend,
                http: self.http,
                runtime,
                registry: HandleRegistry::default(),
            }),
        })
    }
}

impl Hawser {
    /// Start building a new `Hawser`.
    ///
    /// ```rust,ignore
    /// let (backend, _ctl) = hawser_mock::DynamicMockBackend::new_with_controller();
    /// let hawser = hawser::Hawser::builder().backend(backend).build()?;
    /// ```
    #[must_use]
    pub fn builder() -> HawserBuilder {
        HawserBuilder::new()
    }

    /// Connect a new trade session.
    ///
    /// Returns immediately. `callback` receives the new handle (reference count 1) on success,
    /// or an error and no handle.
    pub fn create<C>(&self, config: Config, callback: C, userdata: UserData)
    where
        C: FnOnce(&AsyncResult) + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        execute_async(&self.inner.runtime, None, callback, userdata, async move {
            let session = TradeSession::connect(inner.backend.as_ref(), Arc::new(config)).await?;
            let handle = inner.registry.insert(session);
            #[cfg(feature = "tracing")]
            tracing::debug!(handle = handle.id(), "session handle created");
            Ok(Completion::empty().handle(handle))
        });
    }

    /// Add a reference to `handle`.
    ///
    /// # Panics
    /// Usage error if `handle` has been released or was never issued.
    pub fn retain(&self, handle: SessionHandle) {
        self.inner.registry.retain(handle);
    }

    /// Drop a reference to `handle`.
    ///
    /// The last release tears the session down before returning: the push handler is cleared,
    /// the push task stopped, the connection closed and the attached userdata freed.
    ///
    /// # Panics
    /// Usage error if `handle` has been released or was never issued.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "hawser::release", skip_all, fields(handle = handle.id()))
    )]
    pub fn release(&self, handle: SessionHandle) {
        if let Some(entry) = self.inner.registry.release(handle) {
            teardown(handle, &entry);
        }
    }

    /// Current reference count of `handle`; 0 once released.
    ///
    /// For debugging and tests only: the value may change as soon as it is read.
    #[must_use]
    pub fn ref_count(&self, handle: SessionHandle) -> usize {
        self.inner.registry.ref_count(handle)
    }

    /// Number of handles not yet fully released.
    #[must_use]
    pub fn live_handles(&self) -> usize {
        self.inner.registry.len()
    }

    /// Attach `value` to `handle`, replacing any previous value.
    ///
    /// The replaced value is passed to the current free function straight away. The last value
    /// is passed to it when the handle is torn down.
    ///
    /// # Panics
    /// Usage error if `handle` is not live.
    pub fn set_userdata<T: Any + Send + Sync>(&self, handle: SessionHandle, value: Option<T>) {
        let value = value.map(|v| Box::new(v) as crate::userdata::Opaque);
        self.inner
            .registry
            .get(handle, "set_userdata")
            .set_userdata(value);
    }

    /// Clone of the value attached to `handle`, if it is a `T`.
    ///
    /// # Panics
    /// Usage error if `handle` is not live.
    #[must_use]
    pub fn userdata<T: Any + Clone>(&self, handle: SessionHandle) -> Option<T> {
        self.with_userdata(handle, |v| v.and_then(|v| v.downcast_ref::<T>()).cloned())
    }

    /// Borrow the value attached to `handle` for the duration of `f`.
    ///
    /// No lock is held while `f` runs, so it may call back into the same handle. A value replaced
    /// in the meantime is freed once `f` returns.
    ///
    /// # Panics
    /// Usage error if `handle` is not live.
    pub fn with_userdata<R>(
        &self,
        handle: SessionHandle,
        f: impl FnOnce(Option<&(dyn Any + Send + Sync)>) -> R,
    ) -> R {
        self.inner
            .registry
            .get(handle, "userdata")
            .with_userdata(|v| f(v.map(|boxed| &**boxed)))
    }

    /// Set the function that frees values attached with [`Hawser::set_userdata`].
    ///
    /// # Panics
    /// Usage error if `handle` is not live.
    pub fn set_free_userdata_func(&self, handle: SessionHandle, free: Option<FreeUserDataFn>) {
        self.inner
            .registry
            .get(handle, "set_free_userdata_func")
            .set_free(free);
    }

    /// Register the order-changed callback of `handle`, replacing any previous one.
    ///
    /// `callback` runs once per event, never concurrently with itself for the same handle. The
    /// replaced registration's userdata is freed once any delivery in progress returns; this
    /// registration's userdata is freed when it is replaced or the handle is torn down.
    ///
    /// # Panics
    /// Usage error if `handle` is not live.
    pub fn set_on_order_changed<F>(&self, handle: SessionHandle, callback: F, userdata: UserData)
    where
        F: Fn(SessionHandle, &PushOrderChanged, &UserData) + Send + Sync + 'static,
    {
        let entry = self.inner.registry.get(handle, "set_on_order_changed");
        entry
            .session
            .set_on_order_changed(Some(move |event: &PushOrderChanged| {
                callback(handle, event, &userdata);
            }));
    }

    /// Remove the order-changed callback of `handle`.
    ///
    /// # Panics
    /// Usage error if `handle` is not live.
    pub fn clear_on_order_changed(&self, handle: SessionHandle) {
        self.inner
            .registry
            .get(handle, "clear_on_order_changed")
            .session
            .replace_handler(None);
    }

    /// Subscribe `handle` to `topics`.
    ///
    /// Returns immediately; `callback` reports success or the backend's error.
    ///
    /// # Panics
    /// Usage error if `handle` is not live.
    pub fn subscribe<C>(
        &self,
        handle: SessionHandle,
        topics: &[TopicType],
        callback: C,
        userdata: UserData,
    ) where
        C: FnOnce(&AsyncResult) + Send + 'static,
    {
        let session = self.inner.registry.get(handle, "subscribe").session.clone();
        let topics = topics.to_vec();
        execute_async(&self.inner.runtime, Some(handle), callback, userdata, async move {
            session.subscribe(&topics).await?;
            Ok(Completion::empty())
        });
    }

    /// Unsubscribe `handle` from `topics`.
    ///
    /// # Panics
    /// Usage error if `handle` is not live.
    pub fn unsubscribe<C>(
        &self,
        handle: SessionHandle,
        topics: &[TopicType],
        callback: C,
        userdata: UserData,
    ) where
        C: FnOnce(&AsyncResult) + Send + 'static,
    {
        let session = self
            .inner
            .registry
            .get(handle, "unsubscribe")
            .session
            .clone();
        let topics = topics.to_vec();
        execute_async(&self.inner.runtime, Some(handle), callback, userdata, async move {
            session.unsubscribe(&topics).await?;
            Ok(Completion::empty())
        });
    }

    /// Pass a request through to the HTTP API.
    ///
    /// Returns immediately. On success the payload is the response body as a `String`, with
    /// its length in bytes. A bad method or path is reported through `callback`.
    #[allow(clippy::too_many_arguments)]
    pub fn http_request<C>(
        &self,
        config: Arc<Config>,
        method: &str,
        path: &str,
        headers: &[(&str, &str)],
        body: Option<&str>,
        callback: C,
        userdata: UserData,
    ) where
        C: FnOnce(&AsyncResult) + Send + 'static,
    {
        let request = method.parse::<HttpMethod>().and_then(|m| {
            let mut req = RawRequest::new(m, path)?;
            for (name, value) in headers {
                req = req.header(*name, *value);
            }
            Ok(match body {
                Some(body) => req.body(body),
                None => req,
            })
        });
        let http = self.inner.http.clone();
        execute_async(&self.inner.runtime, None, callback, userdata, async move {
            let http = http.ok_or_else(|| {
                HawserError::invalid_config("no http transport; set one via http_transport(...)")
            })?;
            let text = http.request(&config, request?).await?;
            let len = text.len();
            Ok(Completion::with_payload(text, len))
        });
    }
}

impl Drop for HawserInner {
    fn drop(&mut self) {
        let live = self.registry.drain();
        #[cfg(feature = "tracing")]
        {
            if !live.is_empty() {
                tracing::warn!(count = live.len(), "facade dropped with live handles");
            }
        }
        for (handle, entry) in live {
            teardown(handle, &entry);
        }
    }
}
