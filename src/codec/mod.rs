//! Payload serialization.
//!
//! Each codec is a marker struct with an `encode`/`decode` pair:
//!
//! - [`RawCodec`] - bytes pass through unchanged (message ids on delete)
//! - [`MsgPackCodec`] - named-field MessagePack for caller-defined records
//! - [`JsonCodec`] - JSON for broker-defined replies (queue listing)
//!
//! [`Payload`] records which one produced a request body, so the engine never
//! has to inspect the caller's type.

mod json;
mod msgpack;
mod raw;

pub use json::JsonCodec;
pub use msgpack::MsgPackCodec;
pub use raw::RawCodec;

use bytes::Bytes;
use serde::Serialize;

use crate::error::Result;

/// A request body, tagged by how it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// No body; written as zero bytes.
    Empty,
    /// Bytes sent exactly as given.
    Raw(Bytes),
    /// A caller record encoded with [`MsgPackCodec`].
    Structured(Bytes),
}

impl Payload {
    pub fn raw(data: impl Into<Bytes>) -> Self {
        Payload::Raw(RawCodec::encode(data.into()))
    }

    pub fn structured<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Payload::Structured(Bytes::from(MsgPackCodec::encode(value)?)))
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Empty => 0,
            Payload::Raw(bytes) | Payload::Structured(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            Payload::Empty => Bytes::new(),
            Payload::Raw(bytes) | Payload::Structured(bytes) => bytes,
        }
    }
}
