use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

/// Text codec for replies whose shape the broker fixes.
pub struct JsonCodec;

impl JsonCodec {
    #[inline]
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    #[inline]
    pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
