//! Free-list pool of reusable scratch state
//!
//! Checkout hands an instance to exactly one operation; dropping the
//! [`Pooled`] guard resets it and puts it back. Idle instances are always in
//! reset form, so a poisoned lock is safe to recover.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};
use tracing::trace;

/// Idle instances kept per pool.
const MAX_IDLE: usize = 16;

/// State that can be returned to a pool.
pub(crate) trait Reset: Default {
    /// Return to the empty state, wiping any secrets held.
    fn reset(&mut self);

    /// Heap bytes this instance pins while idle.
    fn retained_capacity(&self) -> usize;
}

pub(crate) struct Pool<T> {
    idle: Mutex<Vec<T>>,
    max_retained: usize,
}

impl<T: Reset> Pool<T> {
    /// `max_retained` bounds the capacity an idle instance may keep; larger
    /// ones are dropped on return instead of pooled.
    pub(crate) const fn new(max_retained: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            max_retained,
        }
    }

    pub(crate) fn checkout(&self) -> Pooled<'_, T> {
        let reused = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        Pooled {
            pool: self,
            value: reused.unwrap_or_default(),
        }
    }

    fn give_back(&self, mut value: T) {
        value.reset();
        if value.retained_capacity() > self.max_retained {
            trace!(
                capacity = value.retained_capacity(),
                "dropping oversized scratch state instead of pooling it"
            );
            return;
        }
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < MAX_IDLE {
            idle.push(value);
        }
    }

    #[cfg(test)]
    pub(crate) fn idle_count(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Exclusive handle on a checked-out instance.
pub(crate) struct Pooled<'a, T: Reset> {
    pool: &'a Pool<T>,
    value: T,
}

impl<T: Reset> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: Reset> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: Reset> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        self.pool.give_back(std::mem::take(&mut self.value));
    }
}
