//! Per-handle mutual exclusion.
//!
//! An engine instance is not reentrant: its allocator and result buffers are
//! global to the instance. [`Guard`] owns the instance and hands out access
//! one caller at a time for the full call protocol. Closing takes the
//! instance out, after which every access fails with
//! [`EngineError::Closed`].

use parking_lot::Mutex;

use crate::error::EngineError;

pub(crate) struct Guard<T> {
    inner: Mutex<Option<T>>,
}

impl<T> Guard<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(Some(value)),
        }
    }

    /// Block until the instance is free, then run `f` on it.
    pub(crate) fn with<R>(
        &self,
        f: impl FnOnce(&mut T) -> Result<R, EngineError>,
    ) -> Result<R, EngineError> {
        let mut slot = self.inner.lock();
        let value = slot.as_mut().ok_or(EngineError::Closed)?;
        f(value)
    }

    /// Run `f` only if the instance is free right now.
    pub(crate) fn try_with<R>(
        &self,
        f: impl FnOnce(&mut T) -> Result<R, EngineError>,
    ) -> Option<Result<R, EngineError>> {
        let mut slot = self.inner.try_lock()?;
        Some(match slot.as_mut() {
            Some(value) => f(value),
            None => Err(EngineError::Closed),
        })
    }

    /// Take the instance out, waiting for any in-flight call.
    pub(crate) fn close(&self) -> Result<T, EngineError> {
        self.inner.lock().take().ok_or(EngineError::Closed)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.inner.lock().is_none()
    }
}
