//! Fixed-width wire records.
//!
//! Every character field is a zero-padded run of big-endian `u32` code points.
//! All integers are big-endian.
//!
//! ```text
//! AuthField (384 bytes)
//! ┌────────────────────────┬──────────────────────────────────────┐
//! │ account id (32 × 4)    │ password (64 × 4)                    │
//! └────────────────────────┴──────────────────────────────────────┘
//!
//! RequestHeader (649 bytes), followed by `data size` payload bytes
//! ┌────────────────────────┬─────────┬──────────────────────┬─────────────┐
//! │ session id (32 × 4)    │ cmd (1) │ queue name (128 × 4) │ data size (8)│
//! └────────────────────────┴─────────┴──────────────────────┴─────────────┘
//!
//! ResponseHeader (9 bytes), followed by `data size` body bytes
//! ┌────────────┬───────────────┐
//! │ result (1) │ data size (8) │
//! └────────────┴───────────────┘
//! ```
//!
//! Text longer than its slot is rejected with [`VmqError::Validation`] before
//! anything is written, never truncated. A NUL code point inside a value is
//! rejected too: it could not be told apart from padding on the other side.

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use ulid::Ulid;

use crate::error::{Result, VmqError};

pub const CODE_POINT_SIZE: usize = 4;
/// Code point used to fill the unused tail of a character field.
pub const FIELD_PADDING: u32 = 0;

pub const SESSION_ID_CHARS: usize = 32;
pub const ACCOUNT_ID_CHARS: usize = 32;
pub const PASSWORD_CHARS: usize = 64;
pub const QUEUE_NAME_CHARS: usize = 128;

pub const SESSION_ID_LEN: usize = SESSION_ID_CHARS * CODE_POINT_SIZE;
pub const AUTH_FIELD_LEN: usize = (ACCOUNT_ID_CHARS + PASSWORD_CHARS) * CODE_POINT_SIZE;
pub const REQUEST_HEADER_LEN: usize = SESSION_ID_LEN + 1 + QUEUE_NAME_CHARS * CODE_POINT_SIZE + 8;
pub const RESPONSE_HEADER_LEN: usize = 1 + 8;

/// Size of the liveness probe the broker answers a ping with.
pub const PROBE_LEN: usize = 64;
pub const MESSAGE_ID_LEN: usize = 26;

/// Command codes. 0 is unused and 1 is the broker's own `quit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    Ping = 2,
    CreateQueue = 3,
    ListQueue = 4,
    DeleteQueue = 5,
    Publish = 6,
    Consume = 7,
    Delete = 8,
}

impl Command {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Ping => "ping",
            Command::CreateQueue => "create_queue",
            Command::ListQueue => "list_queue",
            Command::DeleteQueue => "delete_queue",
            Command::Publish => "publish",
            Command::Consume => "consume",
            Command::Delete => "delete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResultCode {
    Ok = 1,
    Error = 2,
}

impl TryFrom<u8> for ResultCode {
    type Error = VmqError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(ResultCode::Ok),
            2 => Ok(ResultCode::Error),
            other => Err(VmqError::Protocol(format!(
                "Unknown result code: 0x{:02x}",
                other
            ))),
        }
    }
}

/// Checks that `value` fits a field of `width` code points.
pub fn check_text(field: &str, value: &str, width: usize) -> Result<()> {
    let chars = value.chars().count();
    if chars > width {
        return Err(VmqError::Validation(format!(
            "{} is {} characters long (max {})",
            field, chars, width
        )));
    }
    if value.contains('\0') {
        return Err(VmqError::Validation(format!(
            "{} must not contain NUL characters",
            field
        )));
    }
    Ok(())
}

/// Writes `value` as exactly `width` code points, padded with [`FIELD_PADDING`].
pub fn put_text<B: BufMut>(buf: &mut B, field: &str, value: &str, width: usize) -> Result<()> {
    check_text(field, value, width)?;

    let mut written = 0;
    for c in value.chars() {
        buf.put_u32(c as u32);
        written += 1;
    }
    for _ in written..width {
        buf.put_u32(FIELD_PADDING);
    }
    Ok(())
}

/// Reads exactly `width` code points and strips the padding from both ends.
pub fn get_text<B: Buf>(buf: &mut B, field: &str, width: usize) -> Result<String> {
    let need = width * CODE_POINT_SIZE;
    if buf.remaining() < need {
        return Err(VmqError::Protocol(format!(
            "{}: expected {} bytes, got {}",
            field,
            need,
            buf.remaining()
        )));
    }

    let mut text = String::with_capacity(width);
    for _ in 0..width {
        let code = buf.get_u32();
        let c = char::from_u32(code).ok_or_else(|| {
            VmqError::Protocol(format!("{}: invalid code point 0x{:08x}", field, code))
        })?;
        text.push(c);
    }
    Ok(text.trim_matches('\0').to_string())
}

/// Broker-issued session identifier.
///
/// The raw field is kept so that request headers echo back exactly what the
/// broker sent.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionId {
    raw: [u8; SESSION_ID_LEN],
    text: String,
}

impl SessionId {
    /// Parses the handshake reply. Anything that is not a ULID fails
    /// authentication.
    pub fn decode(raw: [u8; SESSION_ID_LEN]) -> Result<Self> {
        let text = get_text(&mut &raw[..], "session id", SESSION_ID_CHARS)
            .map_err(|e| VmqError::Authentication(e.to_string()))?;

        Ulid::from_string(&text).map_err(|e| {
            VmqError::Authentication(format!("malformed session id {:?}: {}", text, e))
        })?;

        Ok(Self { raw, text })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8; SESSION_ID_LEN] {
        &self.raw
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionId").field(&self.text).finish()
    }
}

/// Handshake credentials. Only ever lives on the stack of `connect`.
pub struct AuthField<'a> {
    pub account_id: &'a str,
    pub password: &'a str,
}

impl AuthField<'_> {
    pub fn encode(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(AUTH_FIELD_LEN);
        put_text(&mut buf, "account id", self.account_id, ACCOUNT_ID_CHARS)?;
        put_text(&mut buf, "password", self.password, PASSWORD_CHARS)?;
        Ok(buf.freeze())
    }
}

pub struct RequestHeader<'a> {
    pub session_id: &'a SessionId,
    pub command: Command,
    pub queue_name: &'a str,
    pub data_size: u64,
}

impl RequestHeader<'_> {
    pub fn encode_into(&self, buf: &mut BytesMut) -> Result<()> {
        check_text("queue name", self.queue_name, QUEUE_NAME_CHARS)?;

        buf.reserve(REQUEST_HEADER_LEN);
        buf.put_slice(self.session_id.as_bytes());
        buf.put_u8(self.command.code());
        put_text(buf, "queue name", self.queue_name, QUEUE_NAME_CHARS)?;
        buf.put_u64(self.data_size);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    pub result: ResultCode,
    pub data_size: u64,
}

impl ResponseHeader {
    pub fn decode(raw: &[u8; RESPONSE_HEADER_LEN]) -> Result<Self> {
        let mut buf = &raw[..];
        let result = ResultCode::try_from(buf.get_u8())?;
        let data_size = buf.get_u64();
        Ok(Self { result, data_size })
    }
}
