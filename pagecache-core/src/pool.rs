//! Reuse of [`CachedResponse`] containers.
//!
//! Every cache lookup needs a container to decode into and every miss needs a
//! buffer to capture the handler body into. Drawing those from a pool keeps
//! the header map and body allocations alive across requests. Pooling is a
//! tuning knob only: a pool that always allocates is still correct.

use std::sync::{Mutex, PoisonError};

use crate::CachedResponse;

/// Default number of idle containers a [`ResponsePool`] keeps.
pub const DEFAULT_MAX_IDLE: usize = 64;

/// A source of reusable [`CachedResponse`] containers.
///
/// `get` must return a container in its empty state and `put` accepts any
/// container, resetting it before it can be handed out again.
pub trait Pool: Send + Sync {
    /// Takes an empty container from the pool or allocates a new one.
    fn get(&self) -> CachedResponse;

    /// Returns a container to the pool.
    fn put(&self, value: CachedResponse);
}

/// Mutex-protected free list of response containers.
#[derive(Debug)]
pub struct ResponsePool {
    free: Mutex<Vec<CachedResponse>>,
    max_idle: usize,
}

impl ResponsePool {
    /// Creates a pool keeping at most [`DEFAULT_MAX_IDLE`] idle containers.
    pub fn new() -> Self {
        Self::with_max_idle(DEFAULT_MAX_IDLE)
    }

    /// Creates a pool keeping at most `max_idle` idle containers.
    ///
    /// `0` disables reuse entirely.
    pub fn with_max_idle(max_idle: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            max_idle,
        }
    }

    /// Number of idle containers currently held.
    pub fn idle(&self) -> usize {
        self.free.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for ResponsePool {
    fn default() -> Self {
        Self::new()
    }
}

impl Pool for ResponsePool {
    fn get(&self) -> CachedResponse {
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default()
    }

    fn put(&self, mut value: CachedResponse) {
        if self.max_idle == 0 {
            return;
        }
        value.reset();
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < self.max_idle {
            free.push(value);
        }
    }
}
