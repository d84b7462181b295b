//! Cache key generation.
//!
//! A [`KeyGenerator`] looks at the request head and decides whether the
//! request is cacheable and under which key. Two generators are shipped:
//!
//! - [`RequestUri`] keys on the full request target, path and query.
//! - [`RequestPath`] keys on the path only and ignores the query.
//!
//! Any `Fn(&Parts) -> Option<CacheKey>` closure is a generator too, which is
//! the usual way to key on route parameters or headers:
//!
//! ```
//! use http::request::Parts;
//! use pagecache::key::{DEFAULT_PREFIX, KeyGenerator, generate_key_with_prefix};
//! use pagecache::CacheKey;
//!
//! let by_user = |parts: &Parts| {
//!     let user = parts.headers.get("x-user-id")?.to_str().ok()?;
//!     Some(generate_key_with_prefix(DEFAULT_PREFIX, user))
//! };
//!
//! let request = http::Request::get("/feed").header("x-user-id", "42").body(()).unwrap();
//! let (parts, _) = request.into_parts();
//! assert_eq!(
//!     by_user.generate(&parts),
//!     Some(CacheKey::new("pagecache.page.cache:42")),
//! );
//! ```

use http::request::Parts;
use pagecache_core::CacheKey;
use sha1::{Digest, Sha1};
use smol_str::SmolStr;

/// Namespace prepended to every key built by the shipped generators.
pub const DEFAULT_PREFIX: &str = "pagecache.page.cache:";

/// Longest key suffix stored verbatim; longer ones are replaced by a digest.
pub const MAX_KEY_SUFFIX_LEN: usize = 200;

/// Maps a request head to a cache key, or `None` when the request must not
/// be cached.
pub trait KeyGenerator: Send + Sync {
    /// Computes the key for a request.
    fn generate(&self, parts: &Parts) -> Option<CacheKey>;
}

impl<F> KeyGenerator for F
where
    F: Fn(&Parts) -> Option<CacheKey> + Send + Sync,
{
    fn generate(&self, parts: &Parts) -> Option<CacheKey> {
        self(parts)
    }
}

/// Keys requests on their full target (path and query).
#[derive(Debug, Clone)]
pub struct RequestUri {
    prefix: SmolStr,
}

impl RequestUri {
    /// Creates the generator with a custom namespace prefix.
    pub fn new(prefix: impl Into<SmolStr>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for RequestUri {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl KeyGenerator for RequestUri {
    fn generate(&self, parts: &Parts) -> Option<CacheKey> {
        let target = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        Some(generate_key_with_prefix(&self.prefix, &escape(target)))
    }
}

/// Keys requests on their path only, discarding the query string.
#[derive(Debug, Clone)]
pub struct RequestPath {
    prefix: SmolStr,
}

impl RequestPath {
    /// Creates the generator with a custom namespace prefix.
    pub fn new(prefix: impl Into<SmolStr>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for RequestPath {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl KeyGenerator for RequestPath {
    fn generate(&self, parts: &Parts) -> Option<CacheKey> {
        Some(generate_key_with_prefix(
            &self.prefix,
            &escape(parts.uri.path()),
        ))
    }
}

/// Builds `prefix + key`, bounding the key part.
///
/// Keys longer than [`MAX_KEY_SUFFIX_LEN`] bytes are replaced by the SHA-1
/// digest of the key rendered as 40 lowercase hex characters, so every
/// generated key stays under `prefix.len() + 200` bytes.
pub fn generate_key_with_prefix(prefix: &str, key: &str) -> CacheKey {
    if key.len() > MAX_KEY_SUFFIX_LEN {
        let digest = Sha1::digest(key.as_bytes());
        let mut out = String::with_capacity(prefix.len() + 40);
        out.push_str(prefix);
        out.push_str(&hex::encode(digest));
        return CacheKey::from(out);
    }
    let mut out = String::with_capacity(prefix.len() + key.len());
    out.push_str(prefix);
    out.push_str(key);
    CacheKey::from(out)
}

fn escape(target: &str) -> String {
    form_urlencoded::byte_serialize(target.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;

    fn parts(uri: &str) -> Parts {
        Request::get(uri).body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_request_uri_escapes_target() {
        let key = RequestUri::default().generate(&parts("/ping?a=1&b=two")).unwrap();
        assert_eq!(key.as_str(), "pagecache.page.cache:%2Fping%3Fa%3D1%26b%3Dtwo");
    }

    #[test]
    fn test_request_path_drops_query() {
        let generator = RequestPath::default();
        let plain = generator.generate(&parts("/hello")).unwrap();
        let with_query = generator.generate(&parts("/hello?lang=en")).unwrap();

        assert_eq!(plain, with_query);
        assert_eq!(plain.as_str(), "pagecache.page.cache:%2Fhello");
    }

    #[test]
    fn test_request_uri_distinguishes_queries() {
        let generator = RequestUri::default();
        assert_ne!(
            generator.generate(&parts("/hello?lang=en")),
            generator.generate(&parts("/hello?lang=de")),
        );
    }

    #[test]
    fn test_custom_prefix() {
        let key = RequestPath::new("v2:").generate(&parts("/a")).unwrap();
        assert_eq!(key.as_str(), "v2:%2Fa");
    }

    #[test]
    fn test_long_key_is_digested() {
        let long = "x".repeat(MAX_KEY_SUFFIX_LEN + 1);
        let key = generate_key_with_prefix("p:", &long);

        assert_eq!(key.len(), 2 + 40);
        assert!(key.has_prefix("p:"));
        assert!(key.as_str()[2..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, generate_key_with_prefix("p:", &long));
        assert_ne!(key, generate_key_with_prefix("p:", &"y".repeat(201)));
    }

    #[test]
    fn test_boundary_length_is_kept() {
        let exact = "x".repeat(MAX_KEY_SUFFIX_LEN);
        let key = generate_key_with_prefix("p:", &exact);
        assert_eq!(key.as_str(), format!("p:{exact}"));
    }

    #[test]
    fn test_long_uri_is_bounded() {
        let uri = format!("/search?q={}", "a".repeat(500));
        let key = RequestUri::default().generate(&parts(&uri)).unwrap();
        assert!(key.len() <= DEFAULT_PREFIX.len() + MAX_KEY_SUFFIX_LEN);
    }

    #[test]
    fn test_closure_can_opt_out() {
        let only_get = |parts: &Parts| {
            (parts.method == http::Method::GET).then(|| CacheKey::new("fixed"))
        };
        let post = Request::post("/").body(()).unwrap().into_parts().0;

        assert_eq!(only_get.generate(&parts("/")), Some(CacheKey::new("fixed")));
        assert_eq!(only_get.generate(&post), None);
    }
}
