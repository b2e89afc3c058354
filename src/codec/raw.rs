use bytes::Bytes;

/// Pass-through codec for bytes that are already in wire form.
pub struct RawCodec;

impl RawCodec {
    #[inline]
    pub fn encode(data: Bytes) -> Bytes {
        data
    }

    #[inline]
    pub fn decode(data: &Bytes) -> Bytes {
        data.clone()
    }
}
