//! Structured record codec.
//!
//! Records are written with `rmp_serde::to_vec_named`, so structs travel as
//! maps keyed by field name in declaration order. Decoding into a record of a
//! different shape fails instead of yielding a partially filled value.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

pub struct MsgPackCodec;

impl MsgPackCodec {
    #[inline]
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(value)?)
    }

    #[inline]
    pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}
