//! Ttl handling of the moka store. These tests sleep for real because the
//! store measures time with the system clock.

use std::time::Duration;

use bytes::Bytes;
use pagecache_backend::{Backend, DeleteStatus};
use pagecache_core::CacheKey;
use pagecache_moka::MokaStore;
use pretty_assertions::assert_eq;

fn key(name: &str) -> CacheKey {
    CacheKey::new(format!("pagecache.page.cache:{name}"))
}

#[tokio::test]
async fn test_entry_is_gone_after_ttl() {
    let store = MokaStore::builder().build();
    let key = key("short");

    store
        .write(&key, Bytes::from_static(b"a"), Some(Duration::from_millis(100)))
        .await
        .unwrap();
    assert_eq!(
        store.read(&key).await.unwrap(),
        Some(Bytes::from_static(b"a"))
    );

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(store.read(&key).await.unwrap(), None);
}

#[tokio::test]
async fn test_no_ttl_never_expires() {
    let store = MokaStore::builder().build();
    let key = key("forever");

    store.write(&key, Bytes::from_static(b"a"), None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(store.read(&key).await.unwrap().is_some());
}

#[tokio::test]
async fn test_overwrite_takes_new_ttl() {
    let store = MokaStore::builder().build();
    let key = key("refresh");

    store
        .write(&key, Bytes::from_static(b"old"), Some(Duration::from_millis(100)))
        .await
        .unwrap();
    store
        .write(&key, Bytes::from_static(b"new"), Some(Duration::from_secs(60)))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(
        store.read(&key).await.unwrap(),
        Some(Bytes::from_static(b"new"))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sweep_evicts_unread_entries() {
    let store = MokaStore::builder()
        .sweep_interval(Duration::from_millis(50))
        .build();
    assert!(store.is_sweeping());

    for i in 0..10 {
        store
            .write(
                &key(&format!("sweep-{i}")),
                Bytes::from_static(b"a"),
                Some(Duration::from_millis(50)),
            )
            .await
            .unwrap();
    }
    store.run_pending_tasks().await;
    assert_eq!(store.entry_count(), 10);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(store.entry_count(), 0);
}

#[test]
fn test_sweep_needs_runtime() {
    let store = MokaStore::builder()
        .sweep_interval(Duration::from_millis(50))
        .build();
    assert!(!store.is_sweeping());
}

#[tokio::test]
async fn test_remove() {
    let store = MokaStore::builder().name("pages").build();
    let key = key("gone");

    assert_eq!(store.remove(&key).await.unwrap(), DeleteStatus::Missing);
    store.write(&key, Bytes::from_static(b"a"), None).await.unwrap();
    assert_eq!(store.remove(&key).await.unwrap(), DeleteStatus::Deleted(1));
    assert_eq!(store.read(&key).await.unwrap(), None);
    assert_eq!(store.name().as_str(), "pages");
}
