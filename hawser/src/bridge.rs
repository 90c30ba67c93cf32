//! One-shot completion delivery.
//!
//! Every operation that cannot finish synchronously is spawned on the runtime and reports back
//! through exactly one callback invocation carrying an [`AsyncResult`]. The envelope and the
//! operation's [`UserData`] are dropped as soon as the callback returns.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::OnceLock;

use futures::FutureExt;
use tokio::runtime::{Handle, Runtime};

use crate::handle::SessionHandle;
use crate::userdata::UserData;
use hawser_types::HawserError;

/// Successful result payload.
pub type Payload = Box<dyn Any + Send + Sync>;

/// What a successful operation hands to the bridge.
#[derive(Default)]
pub struct Completion {
    handle: Option<SessionHandle>,
    payload: Option<Payload>,
    length: usize,
}

impl Completion {
    /// Success without payload.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Success carrying `value`, `length` bytes long.
    #[must_use]
    pub fn with_payload<T: Any + Send + Sync>(value: T, length: usize) -> Self {
        Self {
            handle: None,
            payload: Some(Box::new(value)),
            length,
        }
    }

    /// Set the handle reported in the envelope.
    #[must_use]
    pub fn handle(mut self, handle: SessionHandle) -> Self {
        self.handle = Some(handle);
        self
    }
}

/// Envelope passed to an async callback.
///
/// Error and payload are exclusive: a failed operation has an error and no data, a successful
/// one has no error and may have data. Valid only for the duration of the callback.
pub struct AsyncResult {
    handle: Option<SessionHandle>,
    outcome: Result<(Option<Payload>, usize), HawserError>,
    userdata: UserData,
}

impl AsyncResult {
    /// Handle the operation ran on, or the new handle for a successful create. `None` if create
    /// failed.
    #[must_use]
    pub const fn handle(&self) -> Option<SessionHandle> {
        self.handle
    }

    /// The error, if the operation failed.
    #[must_use]
    pub fn error(&self) -> Option<&HawserError> {
        self.outcome.as_ref().err()
    }

    /// `true` if the operation succeeded.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The payload as `T`, if the operation succeeded with one of that type.
    #[must_use]
    pub fn data<T: Any>(&self) -> Option<&T> {
        match &self.outcome {
            Ok((Some(payload), _)) => payload.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Payload length in bytes; 0 without payload.
    #[must_use]
    pub fn length(&self) -> usize {
        self.outcome.as_ref().map_or(0, |(_, len)| *len)
    }

    /// Context supplied when the operation was issued.
    #[must_use]
    pub const fn userdata(&self) -> &UserData {
        &self.userdata
    }
}

/// Callback and context of an operation that has not reported yet.
///
/// If the operation's task is dropped before completing (runtime shutdown), the drop still
/// delivers a failure, so the callback count stays at one.
struct Pending<C>
where
    C: FnOnce(&AsyncResult),
{
    handle: Option<SessionHandle>,
    callback: Option<C>,
    userdata: Option<UserData>,
}

impl<C> Pending<C>
where
    C: FnOnce(&AsyncResult),
{
    fn complete(&mut self, outcome: Result<Completion, HawserError>) {
        let Some(callback) = self.callback.take() else {
            return;
        };
        let (handle, outcome) = match outcome {
            Ok(done) => (
                done.handle.or(self.handle),
                Ok((done.payload, done.length)),
            ),
            Err(err) => (self.handle, Err(err)),
        };
        let result = AsyncResult {
            handle,
            outcome,
            userdata: self.userdata.take().unwrap_or_default(),
        };
        if std::panic::catch_unwind(AssertUnwindSafe(|| callback(&result))).is_err() {
            #[cfg(feature = "tracing")]
            tracing::error!(handle = ?result.handle, "async callback panicked");
        }
    }
}

impl<C> Drop for Pending<C>
where
    C: FnOnce(&AsyncResult),
{
    fn drop(&mut self) {
        self.complete(Err(HawserError::internal(
            "operation dropped before completion",
        )));
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "operation panicked".to_string())
}

/// Spawn `fut` on `runtime` and deliver its outcome to `callback` exactly once.
///
/// Returns immediately. `handle` is reported in the envelope unless the completion names one.
pub(crate) fn execute_async<Fut, C>(
    runtime: &Handle,
    handle: Option<SessionHandle>,
    callback: C,
    userdata: UserData,
    fut: Fut,
) where
    Fut: Future<Output = Result<Completion, HawserError>> + Send + 'static,
    C: FnOnce(&AsyncResult) + Send + 'static,
{
    let mut pending = Pending {
        handle,
        callback: Some(callback),
        userdata: Some(userdata),
    };
    runtime.spawn(async move {
        let outcome = match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let msg = panic_message(panic.as_ref());
                #[cfg(feature = "tracing")]
                tracing::error!(error = %msg, "async operation panicked");
                Err(HawserError::internal(msg))
            }
        };
        pending.complete(outcome);
    });
}

static RUNTIME: OnceLock<Result<Runtime, String>> = OnceLock::new();

/// Process-wide runtime used when no handle is supplied, created on first use.
pub(crate) fn global_runtime() -> Result<Handle, HawserError> {
    let runtime = RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .thread_name("hawser-worker")
            .enable_all()
            .build()
            .map_err(|e| e.to_string())
    });
    match runtime {
        Ok(rt) => Ok(rt.handle().clone()),
        Err(e) => Err(HawserError::internal(format!(
            "failed to start async runtime: {e}"
        ))),
    }
}
