use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use hawser_core::TradeSession;

use crate::userdata::Opaque;

/// Destructor for the value attached with [`Hawser::set_userdata`](crate::Hawser::set_userdata).
pub type FreeUserDataFn = Arc<dyn Fn(Opaque) + Send + Sync>;

/// Opaque identifier of a live trade session.
///
/// A handle is a plain id: copying it does not retain anything. Ids are never reused, so a
/// released handle stays recognisably dead.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionHandle(NonZeroU64);

impl SessionHandle {
    /// Numeric id, for logging.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionHandle({})", self.0)
    }
}

type FreeSlot = Arc<Mutex<Option<FreeUserDataFn>>>;

/// One attached value. Whoever drops the last reference hands it to the free function that is
/// current at that moment.
struct Attached {
    value: Option<Opaque>,
    free: FreeSlot,
}

impl Drop for Attached {
    fn drop(&mut self) {
        let free = self.free.lock().expect("mutex poisoned").clone();
        if let (Some(value), Some(free)) = (self.value.take(), free) {
            free(value);
        }
    }
}

#[derive(Default)]
struct UserDataSlot {
    value: Mutex<Option<Arc<Attached>>>,
    free: FreeSlot,
}

pub(crate) struct HandleEntry {
    refs: AtomicUsize,
    pub(crate) session: TradeSession,
    userdata: UserDataSlot,
}

impl HandleEntry {
    fn replace_value(&self, value: Option<Arc<Attached>>) -> Option<Arc<Attached>> {
        let mut slot = self.userdata.value.lock().expect("mutex poisoned");
        std::mem::replace(&mut *slot, value)
    }

    /// Replace the attached value. The superseded value goes to the current destructor once
    /// no reader holds it.
    pub(crate) fn set_userdata(&self, value: Option<Opaque>) {
        let attached = value.map(|value| {
            Arc::new(Attached {
                value: Some(value),
                free: Arc::clone(&self.userdata.free),
            })
        });
        drop(self.replace_value(attached));
    }

    pub(crate) fn set_free(&self, free: Option<FreeUserDataFn>) {
        *self.userdata.free.lock().expect("mutex poisoned") = free;
    }

    /// Run `f` on the attached value without holding any lock, so `f` may call back into the
    /// same handle.
    pub(crate) fn with_userdata<R>(&self, f: impl FnOnce(Option<&Opaque>) -> R) -> R {
        let current = self.userdata.value.lock().expect("mutex poisoned").clone();
        f(current.as_deref().and_then(|attached| attached.value.as_ref()))
    }

    fn free_userdata(&self) {
        drop(self.replace_value(None));
    }
}

/// Live handles and their reference counts.
///
/// Misuse (unknown handle, release below zero) panics: by then the caller has lost track of
/// ownership and any further step could touch a torn-down session.
pub(crate) struct HandleRegistry {
    next_id: AtomicU64,
    entries: RwLock<HashMap<SessionHandle, Arc<HandleEntry>>>,
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl HandleRegistry {
    /// Register `session` with a reference count of 1.
    pub(crate) fn insert(&self, session: TradeSession) -> SessionHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = SessionHandle(NonZeroU64::new(id).unwrap_or(NonZeroU64::MIN));
        let entry = Arc::new(HandleEntry {
            refs: AtomicUsize::new(1),
            session,
            userdata: UserDataSlot::default(),
        });
        self.entries
            .write()
            .expect("rwlock poisoned")
            .insert(handle, entry);
        handle
    }

    pub(crate) fn try_get(&self, handle: SessionHandle) -> Option<Arc<HandleEntry>> {
        self.entries
            .read()
            .expect("rwlock poisoned")
            .get(&handle)
            .cloned()
    }

    /// Look up a live handle.
    ///
    /// # Panics
    /// Panics if `handle` was never issued or has been released.
    pub(crate) fn get(&self, handle: SessionHandle, op: &str) -> Arc<HandleEntry> {
        self.try_get(handle).unwrap_or_else(|| {
            panic!("usage error: {op} on released or unknown handle {}", handle.id())
        })
    }

    pub(crate) fn retain(&self, handle: SessionHandle) {
        let entry = self.get(handle, "retain");
        let mut current = entry.refs.load(Ordering::Acquire);
        loop {
            assert!(
                current != 0,
                "usage error: retain on released handle {}",
                handle.id()
            );
            match entry.refs.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    /// Drop one reference. Returns the entry if this was the last one; it has already been
    /// removed from the registry.
    pub(crate) fn release(&self, handle: SessionHandle) -> Option<Arc<HandleEntry>> {
        let entry = self.get(handle, "release");
        let mut current = entry.refs.load(Ordering::Acquire);
        loop {
            assert!(
                current != 0,
                "usage error: release below zero on handle {}",
                handle.id()
            );
            match entry.refs.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(1) => break,
                Ok(_) => return None,
                Err(actual) => current = actual,
            }
        }
        self.entries
            .write()
            .expect("rwlock poisoned")
            .remove(&handle);
        Some(entry)
    }

    /// Current count, or 0 once the handle has been released.
    pub(crate) fn ref_count(&self, handle: SessionHandle) -> usize {
        self.try_get(handle)
            .map_or(0, |entry| entry.refs.load(Ordering::Acquire))
    }

    /// Remove every entry regardless of its count.
    pub(crate) fn drain(&self) -> Vec<(SessionHandle, Arc<HandleEntry>)> {
        self.entries
            .write()
            .expect("rwlock poisoned")
            .drain()
            .collect()
    }

    /// Number of live handles.
    pub(crate) fn len(&self) -> usize {
        self.entries.read().expect("rwlock poisoned").len()
    }
}

/// Tear down a handle whose count reached zero.
///
/// Runs on the thread that performed the final release.
pub(crate) fn teardown(handle: SessionHandle, entry: &HandleEntry) {
    entry.session.shutdown();
    entry.free_userdata();
    #[cfg(feature = "tracing")]
    tracing::debug!(handle = handle.id(), "session handle torn down");
    #[cfg(not(feature = "tracing"))]
    let _ = handle;
}
