use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

use crate::CacheKey;

/// Errors observed by a follower waiting on a flight.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConcurrencyError {
    /// The leader went away without publishing a value.
    #[error("in-flight request was abandoned")]
    Closed,
    /// The follower missed the published value.
    #[error("in-flight channel lagged by {0} messages")]
    Lagged(u64),
}

/// Outcome of [`SingleFlight::acquire`].
pub enum Flight<T> {
    /// The caller owns the flight and must run the work.
    Leader(FlightGuard<T>),
    /// Another caller owns the flight; wait for its value.
    Follower(FlightWaiter<T>),
}

/// Deduplicates concurrent work per cache key.
///
/// At most one flight exists per key at any instant. The first caller of
/// [`acquire`](Self::acquire) becomes the leader, every caller arriving while
/// the flight is open becomes a follower and receives the value the leader
/// publishes. Cloning is cheap and clones share the in-flight set, so one
/// instance can serve several routes.
pub struct SingleFlight<T> {
    in_flight: Arc<DashMap<CacheKey, broadcast::Sender<T>>>,
}

impl<T> Clone for SingleFlight<T> {
    fn clone(&self) -> Self {
        Self {
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            in_flight: Arc::new(DashMap::new()),
        }
    }
}

impl<T> std::fmt::Debug for SingleFlight<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleFlight")
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + 'static,
{
    /// Creates an empty coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins or opens the flight for `key`.
    pub fn acquire(&self, key: &CacheKey) -> Flight<T> {
        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(entry) => Flight::Follower(FlightWaiter {
                receiver: entry.get().subscribe(),
            }),
            Entry::Vacant(entry) => {
                let (sender, _) = broadcast::channel(1);
                entry.insert(sender.clone());
                Flight::Leader(FlightGuard {
                    key: key.clone(),
                    sender,
                    in_flight: Arc::clone(&self.in_flight),
                })
            }
        }
    }

    /// Number of open flights.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Runs `work` at most once across concurrent callers with the same key.
    ///
    /// Returns the value and whether it was produced by another caller. If
    /// the leader is dropped before publishing, waiting callers retry and one
    /// of them runs its own `work`.
    pub async fn execute<F, Fut>(&self, key: &CacheKey, work: F) -> (T, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let guard = loop {
            match self.acquire(key) {
                Flight::Leader(guard) => break guard,
                Flight::Follower(waiter) => match waiter.wait().await {
                    Ok(value) => return (value, true),
                    Err(error) => {
                        debug!(%key, %error, "flight abandoned, retrying");
                    }
                },
            }
        };
        let value = work().await;
        guard.complete(value.clone());
        (value, false)
    }
}

/// Ownership of an open flight.
///
/// Dropping the guard without calling [`complete`](Self::complete) closes
/// the flight and wakes every follower with [`ConcurrencyError::Closed`].
pub struct FlightGuard<T> {
    key: CacheKey,
    sender: broadcast::Sender<T>,
    in_flight: Arc<DashMap<CacheKey, broadcast::Sender<T>>>,
}

impl<T> FlightGuard<T> {
    /// Key of this flight.
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Closes the flight and hands `value` to every follower.
    ///
    /// Returns the number of followers that were waiting.
    pub fn complete(self, value: T) -> usize {
        self.release();
        self.sender.send(value).unwrap_or(0)
    }

    // Only the entry holding this guard's channel is removed; a newer flight
    // for the same key is left alone.
    fn release(&self) {
        self.in_flight
            .remove_if(&self.key, |_, sender| sender.same_channel(&self.sender));
    }
}

impl<T> Drop for FlightGuard<T> {
    fn drop(&mut self) {
        self.release();
    }
}

/// A follower's handle on someone else's flight.
pub struct FlightWaiter<T> {
    receiver: broadcast::Receiver<T>,
}

impl<T: Clone> FlightWaiter<T> {
    /// Waits for the leader's value.
    pub async fn wait(mut self) -> Result<T, ConcurrencyError> {
        self.receiver.recv().await.map_err(|error| match error {
            broadcast::error::RecvError::Closed => ConcurrencyError::Closed,
            broadcast::error::RecvError::Lagged(n) => ConcurrencyError::Lagged(n),
        })
    }
}
