#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use pagecache::logger::Logger;
use pagecache::{Backend, BackendError, Cache, CacheKey, DeleteStatus};
use pagecache_backend::BackendResult;
use pagecache_core::{BackendLabel, Raw};

#[derive(Debug, Default)]
pub struct BackendCounters {
    pub read_count: AtomicUsize,
    pub write_count: AtomicUsize,
    pub remove_count: AtomicUsize,
}

/// In-memory backend counting every call and optionally failing.
#[derive(Clone, Debug, Default)]
pub struct SpyBackend {
    pub entries: Arc<DashMap<CacheKey, (Raw, Option<Duration>)>>,
    pub counters: Arc<BackendCounters>,
    pub failing: Arc<AtomicBool>,
    pub read_delay: Duration,
}

impl SpyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let backend = Self::default();
        backend.failing.store(true, Ordering::SeqCst);
        backend
    }

    /// Makes every read answer after `delay`, with the entry as it was when
    /// the read started.
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    pub fn read_count(&self) -> usize {
        self.counters.read_count.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.counters.write_count.load(Ordering::SeqCst)
    }

    pub fn remove_count(&self) -> usize {
        self.counters.remove_count.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.read_count() + self.write_count() + self.remove_count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn ttl_of(&self, key: &CacheKey) -> Option<Option<Duration>> {
        self.entries.get(key).map(|entry| entry.1)
    }

    fn check(&self) -> BackendResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BackendError::ConnectionError(Box::new(std::io::Error::other(
                "spy backend is down",
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for SpyBackend {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<Raw>> {
        self.counters.read_count.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let value = self.entries.get(key).map(|entry| entry.0.clone());
        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }
        Ok(value)
    }

    async fn write(&self, key: &CacheKey, value: Raw, ttl: Option<Duration>) -> BackendResult<()> {
        self.counters.write_count.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.entries.insert(key.clone(), (value, ttl));
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        self.counters.remove_count.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(match self.entries.remove(key) {
            Some(_) => DeleteStatus::Deleted(1),
            None => DeleteStatus::Missing,
        })
    }

    fn name(&self) -> BackendLabel {
        BackendLabel::new_static("spy")
    }
}

/// Logger keeping every message.
#[derive(Clone, Debug, Default)]
pub struct MemoryLogger {
    pub messages: Arc<Mutex<Vec<String>>>,
}

impl MemoryLogger {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Logger for MemoryLogger {
    fn error(&self, message: std::fmt::Arguments<'_>) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// Waits until every open flight of the layer has been released, which
/// happens after the store write of a captured response.
pub async fn settle(cache: &Cache) {
    for _ in 0..200 {
        if cache.config().coordinator().in_flight() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("in-flight requests did not settle");
}
