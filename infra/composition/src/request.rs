use fxhash::FxHashMap;
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Per-request storage keyed by type, supplied by the host for each incoming request.
///
/// The composition provider caches the request's scope here; nothing is shared across requests.
/// Once the request ends the items are closed and no new scope is created for them.
#[derive(Default)]
pub struct RequestItems {
    slots: Mutex<FxHashMap<TypeId, Box<dyn Any + Send + Sync>>>,
    closed: AtomicBool,
}

impl RequestItems {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value`, returning the previous value of the same type.
    pub fn insert<T: Any + Send + Sync>(&self, value: T) -> Option<T> {
        self.slots
            .lock()
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|previous| previous.downcast::<T>().ok())
            .map(|previous| *previous)
    }

    #[must_use]
    pub fn get<T: Any + Send + Sync + Clone>(&self) -> Option<T> {
        self.slots.lock().get(&TypeId::of::<T>()).and_then(|v| v.downcast_ref::<T>()).cloned()
    }

    pub fn remove<T: Any + Send + Sync>(&self) -> Option<T> {
        self.slots
            .lock()
            .remove(&TypeId::of::<T>())
            .and_then(|value| value.downcast::<T>().ok())
            .map(|value| *value)
    }

    /// Marks the request as finished.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.slots.lock().contains_key(&TypeId::of::<T>())
    }

    /// Returns the stored `T`, creating it with `init` on first access.
    ///
    /// `init` runs while the slot map is locked and must not touch the slots of these items.
    ///
    /// # Errors
    /// Propagates the error returned by `init`; nothing is stored in that case.
    pub fn get_or_try_insert_with<T, E>(&self, init: impl FnOnce() -> Result<T, E>) -> Result<T, E>
    where
        T: Any + Send + Sync + Clone,
    {
        let mut slots = self.slots.lock();
        if let Some(value) = slots.get(&TypeId::of::<T>()).and_then(|v| v.downcast_ref::<T>()) {
            return Ok(value.clone());
        }
        let value = init()?;
        slots.insert(TypeId::of::<T>(), Box::new(value.clone()));
        Ok(value)
    }
}

impl fmt::Debug for RequestItems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestItems")
            .field("slots", &self.slots.lock().len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
