use std::io::Write;

use bytes::Bytes;
use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use pagecache_core::{CachedResponse, Raw};

use super::{Encoding, EncodingError};

/// JSON encoding compressed with gzip at the best compression level.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonGzipEncoding;

impl Encoding for JsonGzipEncoding {
    fn encode(&self, value: &CachedResponse) -> Result<Raw, EncodingError> {
        let json =
            serde_json::to_vec(value).map_err(|err| EncodingError::Serialize(Box::new(err)))?;
        let mut encoder = GzEncoder::new(Vec::with_capacity(json.len() / 2), Compression::best());
        encoder.write_all(&json)?;
        Ok(Bytes::from(encoder.finish()?))
    }

    fn decode(&self, data: &[u8], out: &mut CachedResponse) -> Result<(), EncodingError> {
        let value: CachedResponse = serde_json::from_reader(GzDecoder::new(data))
            .map_err(|err| EncodingError::Deserialize(Box::new(err)))?;
        *out = value;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "json+gzip"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsonEncoding;
    use http::{HeaderMap, StatusCode, header::CONTENT_TYPE};
    use pretty_assertions::assert_eq;

    fn html_page() -> CachedResponse {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "text/html; charset=utf-8".parse().unwrap());
        let body = "<li>item</li>".repeat(512);
        CachedResponse::new(StatusCode::OK, headers, body)
    }

    #[test]
    fn test_round_trip() {
        let value = html_page();
        let raw = JsonGzipEncoding.encode(&value).unwrap();

        let mut out = CachedResponse::default();
        JsonGzipEncoding.decode(&raw, &mut out).unwrap();
        assert_eq!(out, value);
    }

    #[test]
    fn test_output_is_gzip_and_smaller_than_json() {
        let value = html_page();
        let gzip = JsonGzipEncoding.encode(&value).unwrap();
        let json = JsonEncoding.encode(&value).unwrap();

        assert_eq!(&gzip[..2], &[0x1f, 0x8b]);
        assert!(gzip.len() < json.len());
    }

    #[test]
    fn test_plain_json_is_rejected() {
        let raw = JsonEncoding.encode(&html_page()).unwrap();
        let mut out = CachedResponse::default();
        assert!(JsonGzipEncoding.decode(&raw, &mut out).is_err());
    }
}
