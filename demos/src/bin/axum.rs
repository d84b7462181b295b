//! Axum Integration Demo
//!
//! Serves a small article API with whole-response caching in front of the
//! handlers.
//!
//! Features shown:
//! - Per-route cache configuration with different TTLs
//! - A custom key generator built from a route parameter
//! - Uncacheable requests (`?nocache`) bypassing the cache
//! - Stampede protection: concurrent misses run the handler once
//!
//! Run:
//!   cargo run -p pagecache-demos --bin axum
//!
//! Try it:
//!   curl -i http://localhost:3000/articles                # MISS, then HIT
//!   curl -i http://localhost:3000/articles/1              # keyed by id only
//!   curl -i http://localhost:3000/articles/1?utm=x        # same key as above
//!   curl -i http://localhost:3000/articles/1?nocache      # BYPASS
//!   curl -i http://localhost:3000/articles/42             # 404, never cached
//!   seq 20 | xargs -P20 -I{} curl -s -o /dev/null -w '%header{x-cache-status}\n' \
//!     http://localhost:3000/slow                          # one MISS, SHARED rest

use std::time::Duration;

use axum::{Json, Router, extract::Path, routing::get};
use http::request::Parts;
use pagecache::key::generate_key_with_prefix;
use pagecache::logger::TracingLogger;
use pagecache::policy::random_jitter;
use pagecache::{Cache, CacheConfig, CacheKey};
use pagecache_moka::MokaStore;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
struct Article {
    id: u32,
    title: &'static str,
}

const ARTICLES: [Article; 3] = [
    Article {
        id: 1,
        title: "Caching whole responses",
    },
    Article {
        id: 2,
        title: "Surviving a cache stampede",
    },
    Article {
        id: 3,
        title: "Choosing a ttl",
    },
];

async fn list_articles() -> Json<Vec<Article>> {
    tracing::info!("Fetching article list");
    Json(ARTICLES.to_vec())
}

async fn get_article(Path(id): Path<u32>) -> Result<Json<Article>, http::StatusCode> {
    tracing::info!("Fetching article: id={}", id);
    ARTICLES
        .iter()
        .find(|article| article.id == id)
        .cloned()
        .map(Json)
        .ok_or(http::StatusCode::NOT_FOUND)
}

async fn slow() -> &'static str {
    tracing::info!("Rendering slow page");
    tokio::time::sleep(Duration::from_secs(1)).await;
    "rendered once"
}

/// Keys article pages by id, ignoring any other query string. Requests with
/// `nocache` in the query are not cacheable.
fn article_key(parts: &Parts) -> Option<CacheKey> {
    if parts.uri.query().is_some_and(|q| q.contains("nocache")) {
        return None;
    }
    let id = parts.uri.path().strip_prefix("/articles/")?;
    Some(generate_key_with_prefix("demo.article:", id))
}

#[tokio::main]
async fn main() {
    let subscriber = tracing_subscriber::fmt()
        .pretty()
        .with_env_filter("info,pagecache=debug")
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let store = MokaStore::builder()
        .max_capacity(10_000)
        .sweep_interval(Duration::from_secs(30))
        .build();

    let list_cache = Cache::new(
        CacheConfig::builder(store.clone())
            .ttl(Duration::from_secs(60))
            .jitter(random_jitter(Duration::from_secs(10)))
            .logger(TracingLogger)
            .status_header(true)
            .build()
            .expect("valid cache config"),
    );

    let article_cache = Cache::new(
        CacheConfig::builder(store.clone())
            .ttl(Duration::from_secs(300))
            .key_generator(article_key)
            .logger(TracingLogger)
            .status_header(true)
            .build()
            .expect("valid cache config"),
    );

    let slow_cache = Cache::new(
        CacheConfig::builder(store)
            .ttl(Duration::from_secs(5))
            .logger(TracingLogger)
            .status_header(true)
            .build()
            .expect("valid cache config"),
    );

    let app = Router::new()
        .route("/articles", get(list_articles).layer(list_cache))
        .route("/articles/{id}", get(get_article).layer(article_cache))
        .route("/slow", get(slow).layer(slow_cache));

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("Failed to bind to port 3000");
    tracing::info!("Listening on http://{}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("Server error");
}
