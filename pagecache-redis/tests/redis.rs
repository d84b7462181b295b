//! These tests need a Redis server on `REDIS_URL` (default
//! `redis://127.0.0.1:6379/`). Run them with `cargo test -- --ignored`.

use std::convert::Infallible;
use std::time::Duration;

use pagecache::{Backend, Cache, CacheKey, DeleteStatus};
use pagecache_redis::RedisStore;
use pretty_assertions::assert_eq;

fn store() -> RedisStore {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/".to_owned());
    RedisStore::builder().server(url).build().unwrap()
}

fn key(name: &str) -> CacheKey {
    CacheKey::new(format!("pagecache.test:{name}"))
}

#[tokio::test]
#[ignore]
async fn test_write_read_remove() {
    let store = store();
    let key = key("roundtrip");

    store
        .write(&key, "payload".into(), Some(Duration::from_secs(10)))
        .await
        .unwrap();
    assert_eq!(store.read(&key).await.unwrap().as_deref(), Some(&b"payload"[..]));
    assert_eq!(store.remove(&key).await.unwrap(), DeleteStatus::Deleted(1));
    assert_eq!(store.read(&key).await.unwrap(), None);
    assert_eq!(store.remove(&key).await.unwrap(), DeleteStatus::Missing);
}

#[tokio::test]
#[ignore]
async fn test_ttl_expires() {
    let store = store();
    let key = key("short");

    store
        .write(&key, "payload".into(), Some(Duration::from_millis(100)))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(store.read(&key).await.unwrap(), None);
}

#[tokio::test]
#[ignore]
async fn test_no_ttl_is_persistent() {
    let store = store();
    let key = key("persistent");

    store.write(&key, "payload".into(), None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(store.read(&key).await.unwrap().is_some());
    store.remove(&key).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore]
async fn test_layer_shares_responses_through_redis() {
    use http::{Request, Response};
    use tower::{Layer, ServiceExt, service_fn};

    let layer = Cache::with_request_path(store(), Duration::from_secs(5));
    let service = layer.layer(service_fn(|_req: Request<()>| async {
        Ok::<_, Infallible>(Response::new(http_body_util::Full::new(
            bytes::Bytes::from_static(b"from redis"),
        )))
    }));

    let response = service
        .clone()
        .oneshot(Request::get("/redis-layer").body(()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}
