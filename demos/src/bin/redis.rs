//! Redis Store Demo
//!
//! Shares cached pages between processes through Redis. The cache policy is
//! read from YAML.
//!
//! Run (start two on different ports to see responses shared):
//!   docker run --rm -p 6379:6379 redis
//!   PORT=3001 cargo run -p pagecache-demos --bin redis
//!   PORT=3002 cargo run -p pagecache-demos --bin redis
//!
//! Try it:
//!   curl -i http://localhost:3001/time     # MISS
//!   curl -i http://localhost:3002/time     # HIT, rendered by the first process

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{Router, routing::get};
use pagecache::logger::TracingLogger;
use pagecache::policy::PolicyConfig;
use pagecache::{Cache, CacheConfig};
use pagecache_redis::RedisStore;

const POLICY: &str = r#"
ttl: 30s
jitter: 5s
prefix: "demo.redis:"
key: RequestPath
encoding: JsonGzip
status_header: true
"#;

async fn time() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    tracing::info!("Rendering time page");
    format!("rendered at {now}\n")
}

#[tokio::main]
async fn main() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter("info,pagecache=debug")
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/".to_owned());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_owned());

    let store = RedisStore::builder()
        .server(url)
        .name("shared")
        .build()
        .expect("valid redis url");
    let policy: PolicyConfig = serde_saphyr::from_str(POLICY).expect("valid policy");
    tracing::info!(?policy, "Loaded cache policy");

    let cache = Cache::new(
        CacheConfig::builder(store)
            .policy(&policy)
            .expect("policy encoding is available")
            .logger(TracingLogger)
            .build()
            .expect("valid cache config"),
    );

    let app = Router::new().route("/time", get(time).layer(cache));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("Failed to bind");
    tracing::info!("Listening on http://{}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("Server error");
}
