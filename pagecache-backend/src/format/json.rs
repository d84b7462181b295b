use bytes::Bytes;
use pagecache_core::{CachedResponse, Raw};

use super::{Encoding, EncodingError};

/// JSON encoding (default).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoding;

impl Encoding for JsonEncoding {
    fn encode(&self, value: &CachedResponse) -> Result<Raw, EncodingError> {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|err| EncodingError::Serialize(Box::new(err)))
    }

    fn decode(&self, data: &[u8], out: &mut CachedResponse) -> Result<(), EncodingError> {
        let value: CachedResponse =
            serde_json::from_slice(data).map_err(|err| EncodingError::Deserialize(Box::new(err)))?;
        *out = value;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "json"
    }
}
