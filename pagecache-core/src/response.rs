//! Stored representation of a whole HTTP response.

use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode};
use serde::{Deserialize, Serialize};

/// A fully buffered HTTP response as it is kept in a store.
///
/// The value is produced once per handler execution and is not modified after
/// it has been handed to a store or shared with concurrent waiters. Headers
/// keep their multi-value semantics and the order in which the handler set
/// them.
///
/// ```
/// use http::{HeaderMap, StatusCode, header::CONTENT_TYPE};
/// use pagecache_core::CachedResponse;
///
/// let mut headers = HeaderMap::new();
/// headers.insert(CONTENT_TYPE, "text/plain".parse().unwrap());
/// let cached = CachedResponse::new(StatusCode::OK, headers, "hello world");
///
/// let response = cached.to_response();
/// assert_eq!(response.status(), StatusCode::OK);
/// assert_eq!(response.body().as_ref(), b"hello world");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    #[serde(with = "http_serde::status_code")]
    status: StatusCode,
    #[serde(with = "http_serde::header_map")]
    headers: HeaderMap,
    #[serde(with = "serde_bytes")]
    body: Vec<u8>,
}

impl CachedResponse {
    /// Creates a response from its parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Response status code.
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers in handler order.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw response body.
    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Whether the status is in the `200..300` range.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Replaces status and headers, reusing the existing header allocation.
    ///
    /// Every value of every header is copied in iteration order, so repeated
    /// headers such as `set-cookie` survive unchanged.
    pub fn set_head(&mut self, status: StatusCode, headers: &HeaderMap) {
        self.status = status;
        self.headers.clear();
        self.headers.reserve(headers.len());
        for (name, value) in headers {
            self.headers.append(name.clone(), value.clone());
        }
    }

    /// Appends a chunk of body bytes.
    #[inline]
    pub fn extend_body(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }

    /// Returns the value to its empty state while keeping allocations.
    pub fn reset(&mut self) {
        self.status = StatusCode::OK;
        self.headers.clear();
        self.body.clear();
    }

    /// Consumes the response and returns `(status, headers, body)`.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Vec<u8>) {
        (self.status, self.headers, self.body)
    }

    /// Builds an `http::Response` carrying a copy of this response.
    pub fn to_response(&self) -> Response<Bytes> {
        let mut response = Response::new(Bytes::copy_from_slice(&self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers.clone();
        response
    }
}

impl Default for CachedResponse {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{CONTENT_TYPE, SET_COOKIE};
    use pretty_assertions::assert_eq;

    fn multi_header_response() -> CachedResponse {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());
        headers.append(SET_COOKIE, "a=1".parse().unwrap());
        headers.append(SET_COOKIE, "b=2".parse().unwrap());
        CachedResponse::new(StatusCode::CREATED, headers, br#"{"ok":true}"#.to_vec())
    }

    #[test]
    fn test_set_head_keeps_every_value() {
        let source = multi_header_response();
        let mut target = CachedResponse::default();
        target.set_head(source.status(), source.headers());

        let cookies: Vec<_> = target.headers().get_all(SET_COOKIE).iter().collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
        assert_eq!(target.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_reset_clears_but_keeps_capacity() {
        let mut response = multi_header_response();
        let capacity = response.body.capacity();
        response.reset();

        assert_eq!(response, CachedResponse::default());
        assert_eq!(response.body.capacity(), capacity);
    }

    #[test]
    fn test_to_response_copies_everything() {
        let cached = multi_header_response();
        let response = cached.to_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers(), cached.headers());
        assert_eq!(response.body().as_ref(), cached.body());
    }

    #[test]
    fn test_serde_preserves_multi_value_headers() {
        let cached = multi_header_response();
        let json = serde_json::to_vec(&cached).unwrap();
        let decoded: CachedResponse = serde_json::from_slice(&json).unwrap();
        assert_eq!(decoded, cached);
    }
}
