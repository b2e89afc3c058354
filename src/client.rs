use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    codec::{JsonCodec, MsgPackCodec, Payload},
    config::{Config, ConfigBuilder},
    error::{Result, VmqError},
    message::{ListQueuesReply, Message, MessageId},
    session::Session,
    wire::{Command, MESSAGE_ID_LEN, PROBE_LEN},
};

/// The main client for a VMQ broker.
///
/// A `VmqClient` wraps one authenticated connection. Every operation is a
/// single request/response exchange; calls made concurrently through clones of
/// the same client are queued on an internal lock, so at most one request is
/// ever in flight on the socket.
///
/// Nothing is retried. If an error reports
/// [`is_connection_fatal`](VmqError::is_connection_fatal), close the client
/// and connect again.
///
/// # Examples
///
/// ```no_run
/// use serde::{Deserialize, Serialize};
/// use vmq_client::VmqClient;
///
/// #[derive(Serialize, Deserialize, Debug)]
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// #[tokio::main]
/// async fn main() -> Result<(), vmq_client::VmqError> {
///     let client = VmqClient::new("localhost", 9000, "01HG17X22440GTQW3AS6WHCF0K", "P@ssw0rd").await?;
///
///     client.create_queue("example queue").await?;
///     client.publish("example queue", &User { id: 1, name: "Jhon".into() }).await?;
///
///     let message = client.consume::<User>("example queue").await?;
///     println!("{} -> {:?}", message.id, message.data);
///     client.delete("example queue", &message.id).await?;
///
///     client.close().await
/// }
/// ```
#[derive(Clone)]
pub struct VmqClient {
    session: Arc<Session>,
}

impl VmqClient {
    /// Connects to `host:port` and authenticates with default settings.
    ///
    /// # Errors
    ///
    /// * [`VmqError::Validation`] if a credential does not fit its wire slot
    /// * [`VmqError::Connection`] or [`VmqError::Timeout`] if the broker cannot be reached
    /// * [`VmqError::Authentication`] if the broker does not hand back a valid session id
    pub async fn new(
        host: impl Into<String>,
        port: u16,
        user_id: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let config = ConfigBuilder::new()
            .host(host)
            .port(port)
            .user_id(user_id)
            .password(password)
            .build();

        Self::connect(&config).await
    }

    /// Connects and authenticates using a custom [`Config`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use vmq_client::VmqClient;
    ///
    /// # async fn example() -> Result<(), vmq_client::VmqError> {
    /// let config = VmqClient::builder()
    ///     .host("queue.example.com")
    ///     .port(9000)
    ///     .user_id("01HG17X22440GTQW3AS6WHCF0K")
    ///     .password("P@ssw0rd")
    ///     .request_timeout(Duration::from_secs(5))
    ///     .build();
    ///
    /// let client = VmqClient::connect(&config).await?;
    /// println!("session {}", client.id());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(config: &Config) -> Result<Self> {
        let session = Session::connect(config).await?;
        Ok(Self {
            session: Arc::new(session),
        })
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// The broker-issued session identifier (a ULID).
    pub fn id(&self) -> &str {
        self.session.id()
    }

    /// Closes the connection for this client and all of its clones.
    ///
    /// A call still waiting on the broker through another clone is aborted
    /// with [`VmqError::ConnectionUnusable`]. Closing twice is a no-op. Any later call fails with
    /// [`VmqError::ConnectionUnusable`].
    pub async fn close(&self) -> Result<()> {
        self.session.close().await
    }

    /// Checks that the broker is answering on this session.
    ///
    /// # Errors
    ///
    /// * [`VmqError::Io`] if the connection was severed
    /// * [`VmqError::Protocol`] if the probe is not exactly 64 bytes; the
    ///   connection is closed
    pub async fn ping(&self) -> Result<()> {
        let body = self.session.request("", Command::Ping, Payload::Empty).await?;

        if body.len() != PROBE_LEN {
            let err = VmqError::Protocol(format!(
                "Ping probe: expected {} bytes, got {}",
                PROBE_LEN,
                body.len()
            ));
            return Err(self.session.abandon(err).await);
        }
        Ok(())
    }

    pub async fn create_queue(&self, queue_name: &str) -> Result<()> {
        self.session
            .request(queue_name, Command::CreateQueue, Payload::Empty)
            .await?;
        Ok(())
    }

    /// Lists queue names in the order the broker reports them.
    pub async fn list_queues(&self) -> Result<Vec<String>> {
        let body = self
            .session
            .request("", Command::ListQueue, Payload::Empty)
            .await?;

        let reply: ListQueuesReply = JsonCodec::decode(&body)?;
        Ok(reply.into_names())
    }

    pub async fn delete_queue(&self, queue_name: &str) -> Result<()> {
        self.session
            .request(queue_name, Command::DeleteQueue, Payload::Empty)
            .await?;
        Ok(())
    }

    /// Publishes a record to `queue_name`.
    ///
    /// The record is encoded as named-field MessagePack; consumers must decode
    /// it into a type of the same shape.
    pub async fn publish<T>(&self, queue_name: &str, message: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let payload = Payload::structured(message)?;
        self.session
            .request(queue_name, Command::Publish, payload)
            .await?;
        Ok(())
    }

    /// Takes the next message from `queue_name` and decodes its payload as `T`.
    ///
    /// The message is not acknowledged; call [`delete`](Self::delete) with its
    /// id once it has been processed. Whether an undeleted message is handed
    /// out again is up to the broker.
    ///
    /// # Errors
    ///
    /// * [`VmqError::Server`] if the broker refuses (e.g. empty or unknown queue)
    /// * [`VmqError::Protocol`] if the body does not start with a message id;
    ///   the connection is closed
    /// * [`VmqError::Decode`] if the payload does not have the shape of `T`
    pub async fn consume<T>(&self, queue_name: &str) -> Result<Message<T>>
    where
        T: DeserializeOwned,
    {
        let body = self
            .session
            .request(queue_name, Command::Consume, Payload::Empty)
            .await?;

        if body.len() < MESSAGE_ID_LEN {
            let err = VmqError::Protocol(format!(
                "Consume reply: expected at least {} bytes, got {}",
                MESSAGE_ID_LEN,
                body.len()
            ));
            return Err(self.session.abandon(err).await);
        }

        let (id, data) = body.split_at(MESSAGE_ID_LEN);
        let id = match MessageId::try_from(id) {
            Ok(id) => id,
            Err(e) => {
                let err = VmqError::Protocol(e.to_string());
                return Err(self.session.abandon(err).await);
            }
        };
        let data = MsgPackCodec::decode(data)?;

        Ok(Message { id, data })
    }

    /// Deletes (acknowledges) a consumed message.
    pub async fn delete(&self, queue_name: &str, message_id: &MessageId) -> Result<()> {
        let payload = Payload::raw(message_id.as_bytes().to_vec());
        self.session
            .request(queue_name, Command::Delete, payload)
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for VmqClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VmqClient")
            .field("session", &self.session.id())
            .finish()
    }
}
