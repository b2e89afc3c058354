use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::VmqError;
use crate::wire::MESSAGE_ID_LEN;

/// Identifier of one in-flight message, as assigned by the broker.
///
/// Always exactly 26 ASCII bytes (a ULID in its canonical text form). The
/// client treats it as opaque apart from equality, rendering and handing it
/// back to [`VmqClient::delete`](crate::VmqClient::delete).
///
/// # Examples
///
/// ```
/// use vmq_client::MessageId;
///
/// let id: MessageId = "01HJXVRZ9QJSCAHEKFNAZHTFMS".parse().unwrap();
/// assert_eq!(id.to_string(), "01HJXVRZ9QJSCAHEKFNAZHTFMS");
/// assert!(id.timestamp_ms().is_some());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MessageId([u8; MESSAGE_ID_LEN]);

impl MessageId {
    pub fn as_bytes(&self) -> &[u8; MESSAGE_ID_LEN] {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        // Constructors only admit ASCII.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Creation time encoded in the id, when it is a well-formed ULID.
    pub fn timestamp_ms(&self) -> Option<u64> {
        Ulid::from_string(self.as_str())
            .ok()
            .map(|ulid| ulid.timestamp_ms())
    }
}

impl TryFrom<&[u8]> for MessageId {
    type Error = VmqError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let raw: [u8; MESSAGE_ID_LEN] = bytes.try_into().map_err(|_| {
            VmqError::Validation(format!(
                "message id must be {} bytes, got {}",
                MESSAGE_ID_LEN,
                bytes.len()
            ))
        })?;
        if !raw.is_ascii() {
            return Err(VmqError::Validation(
                "message id must be ASCII".to_string(),
            ));
        }
        Ok(Self(raw))
    }
}

impl FromStr for MessageId {
    type Err = VmqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.as_bytes())
    }
}

impl TryFrom<String> for MessageId {
    type Error = VmqError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MessageId> for String {
    fn from(id: MessageId) -> Self {
        id.as_str().to_string()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageId({})", self.as_str())
    }
}

/// A consumed message: its broker id plus the decoded payload.
///
/// The message stays with the broker until it is deleted; consuming alone
/// does not acknowledge it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message<T> {
    pub id: MessageId,
    pub data: T,
}

/// Body of a `list_queue` reply.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ListQueuesReply {
    #[serde(default)]
    pub queues: Option<Vec<String>>,
}

impl ListQueuesReply {
    pub fn into_names(self) -> Vec<String> {
        self.queues.unwrap_or_default()
    }
}
