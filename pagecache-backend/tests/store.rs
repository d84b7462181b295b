use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use http::{HeaderMap, StatusCode, header::CONTENT_TYPE};
use pagecache_backend::{
    Backend, BackendError, BackendResult, DeleteStatus, JsonEncoding, Store, StoreError,
};
use pagecache_core::{BackendLabel, CacheKey, CachedResponse, Raw};
use pretty_assertions::assert_eq;

/// In-memory backend remembering the ttl of every write.
#[derive(Clone, Default)]
struct RecordingBackend {
    entries: Arc<DashMap<CacheKey, (Raw, Option<Duration>)>>,
}

#[async_trait]
impl Backend for RecordingBackend {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<Raw>> {
        Ok(self.entries.get(key).map(|entry| entry.0.clone()))
    }

    async fn write(&self, key: &CacheKey, value: Raw, ttl: Option<Duration>) -> BackendResult<()> {
        self.entries.insert(key.clone(), (value, ttl));
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        Ok(match self.entries.remove(key) {
            Some(_) => DeleteStatus::Deleted(1),
            None => DeleteStatus::Missing,
        })
    }

    fn name(&self) -> BackendLabel {
        BackendLabel::new_static("recording")
    }
}

struct BrokenBackend;

fn refused() -> BackendError {
    BackendError::ConnectionError(Box::new(std::io::Error::other("connection refused")))
}

#[async_trait]
impl Backend for BrokenBackend {
    async fn read(&self, _key: &CacheKey) -> BackendResult<Option<Raw>> {
        Err(refused())
    }

    async fn write(&self, _key: &CacheKey, _value: Raw, _ttl: Option<Duration>) -> BackendResult<()> {
        Err(refused())
    }

    async fn remove(&self, _key: &CacheKey) -> BackendResult<DeleteStatus> {
        Ok(DeleteStatus::Missing)
    }
}

fn page() -> CachedResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, "text/plain".parse().unwrap());
    CachedResponse::new(StatusCode::OK, headers, "hello world")
}

#[tokio::test]
async fn test_get_absent_is_cache_miss() {
    let backend = RecordingBackend::default();
    let mut out = CachedResponse::default();

    let err = backend
        .get(&CacheKey::from("page:/nope"), &mut out, &JsonEncoding)
        .await
        .unwrap_err();
    assert!(err.is_miss());
}

#[tokio::test]
async fn test_set_then_get() {
    let backend = RecordingBackend::default();
    let key = CacheKey::from("page:/hello");

    backend
        .set(&key, &page(), Duration::from_secs(60), &JsonEncoding)
        .await
        .unwrap();

    let mut out = CachedResponse::default();
    backend.get(&key, &mut out, &JsonEncoding).await.unwrap();
    assert_eq!(out, page());
    assert_eq!(
        backend.entries.get(&key).unwrap().1,
        Some(Duration::from_secs(60))
    );
}

#[tokio::test]
async fn test_zero_ttl_writes_without_expiry() {
    let backend = RecordingBackend::default();
    let key = CacheKey::from("page:/forever");

    backend
        .set(&key, &page(), Duration::ZERO, &JsonEncoding)
        .await
        .unwrap();
    assert_eq!(backend.entries.get(&key).unwrap().1, None);
}

#[tokio::test]
async fn test_set_overwrites() {
    let backend = RecordingBackend::default();
    let key = CacheKey::from("page:/v");
    let second = CachedResponse::new(StatusCode::OK, HeaderMap::new(), "second");

    backend.set(&key, &page(), Duration::ZERO, &JsonEncoding).await.unwrap();
    backend.set(&key, &second, Duration::ZERO, &JsonEncoding).await.unwrap();

    let mut out = CachedResponse::default();
    backend.get(&key, &mut out, &JsonEncoding).await.unwrap();
    assert_eq!(out.body(), b"second");
}

#[tokio::test]
async fn test_delete_missing_succeeds() {
    let backend = RecordingBackend::default();
    let key = CacheKey::from("page:/gone");

    assert_eq!(backend.delete(&key).await.unwrap(), DeleteStatus::Missing);
    backend.set(&key, &page(), Duration::ZERO, &JsonEncoding).await.unwrap();
    assert_eq!(backend.delete(&key).await.unwrap(), DeleteStatus::Deleted(1));
}

#[tokio::test]
async fn test_corrupt_entry_is_encoding_error() {
    let backend = RecordingBackend::default();
    let key = CacheKey::from("page:/corrupt");
    backend
        .write(&key, Raw::from_static(b"{\"status\":"), None)
        .await
        .unwrap();

    let mut out = CachedResponse::default();
    let err = backend.get(&key, &mut out, &JsonEncoding).await.unwrap_err();
    assert!(matches!(err, StoreError::Encoding(_)));
    assert_eq!(out, CachedResponse::default());
}

#[tokio::test]
async fn test_backend_failures_surface_as_backend_error() {
    let store: Arc<dyn Store> = Arc::new(BrokenBackend);
    let key = CacheKey::from("page:/down");

    let mut out = CachedResponse::default();
    let read = store.get(&key, &mut out, &JsonEncoding).await.unwrap_err();
    assert!(matches!(read, StoreError::Backend(BackendError::ConnectionError(_))));

    let write = store
        .set(&key, &page(), Duration::from_secs(1), &JsonEncoding)
        .await
        .unwrap_err();
    assert!(matches!(write, StoreError::Backend(_)));
    assert_eq!(store.label().as_str(), "backend");
}

#[cfg(feature = "gzip")]
#[tokio::test]
async fn test_gzip_encoding_through_store() {
    use pagecache_backend::JsonGzipEncoding;

    let backend = RecordingBackend::default();
    let key = CacheKey::from("page:/gz");
    backend
        .set(&key, &page(), Duration::ZERO, &JsonGzipEncoding)
        .await
        .unwrap();

    let mut out = CachedResponse::default();
    backend.get(&key, &mut out, &JsonGzipEncoding).await.unwrap();
    assert_eq!(out, page());
}
