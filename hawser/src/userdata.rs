use std::any::Any;
use std::fmt;

/// Type-erased value owned on behalf of a caller.
pub type Opaque = Box<dyn Any + Send + Sync>;

/// Caller context attached to one operation or one push registration.
///
/// Owns the value and, optionally, a hook that receives it when the `UserData` is dropped. The
/// hook runs exactly once; a `UserData` without a hook simply drops its value.
#[derive(Default)]
pub struct UserData {
    value: Option<Opaque>,
    free: Option<Box<dyn FnOnce(Opaque) + Send + Sync>>,
}

impl UserData {
    /// No context.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Wrap `value`; it is dropped normally.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Some(Box::new(value)),
            free: None,
        }
    }

    /// Wrap `value` and hand it to `free` when this context is released.
    #[must_use]
    pub fn with_free<T, F>(value: T, free: F) -> Self
    where
        T: Any + Send + Sync,
        F: FnOnce(T) + Send + Sync + 'static,
    {
        Self {
            value: Some(Box::new(value)),
            free: Some(Box::new(move |opaque: Opaque| {
                if let Ok(value) = opaque.downcast::<T>() {
                    free(*value);
                }
            })),
        }
    }

    /// `true` if no value is held.
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.value.is_none()
    }

    /// Borrow the value as `T`.
    #[must_use]
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.value.as_deref().and_then(|v| v.downcast_ref::<T>())
    }
}

impl Drop for UserData {
    fn drop(&mut self) {
        if let (Some(value), Some(free)) = (self.value.take(), self.free.take()) {
            free(value);
        }
    }
}

impl fmt::Debug for UserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserData")
            .field("present", &self.value.is_some())
            .field("has_free", &self.free.is_some())
            .finish()
    }
}
