use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    client::VmqClient,
    config::Config,
    error::{Result, VmqError},
    message::{Message, MessageId},
    wire::{check_text, QUEUE_NAME_CHARS},
};

/// A client bound to one queue and one message type.
///
/// # Examples
///
/// ```no_run
/// use serde::{Deserialize, Serialize};
/// use vmq_client::{ConfigBuilder, QueueSession};
///
/// #[derive(Serialize, Deserialize, Debug)]
/// struct Job {
///     id: u64,
///     command: String,
/// }
///
/// # async fn example() -> Result<(), vmq_client::VmqError> {
/// let config = ConfigBuilder::new()
///     .user_id("01HG17X22440GTQW3AS6WHCF0K")
///     .password("P@ssw0rd")
///     .queue_name("jobs")
///     .build();
///
/// let jobs = QueueSession::<Job>::connect(&config).await?;
/// jobs.publish(&Job { id: 1, command: "resize".into() }).await?;
///
/// let job = jobs.consume().await?;
/// jobs.delete(&job.id).await?;
/// # Ok(())
/// # }
/// ```
pub struct QueueSession<T> {
    client: VmqClient,
    queue_name: String,
    _message: PhantomData<fn() -> T>,
}

impl<T> QueueSession<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Connects using `config`, which must carry a `queue_name`.
    pub async fn connect(config: &Config) -> Result<Self> {
        let queue_name = config.queue_name.clone().ok_or_else(|| {
            VmqError::Validation("queue_name is required for a queue session".to_string())
        })?;
        check_text("queue name", &queue_name, QUEUE_NAME_CHARS)?;

        let client = VmqClient::connect(config).await?;
        Ok(Self::new(client, queue_name))
    }

    /// Binds an existing client to `queue_name`.
    pub fn new(client: VmqClient, queue_name: impl Into<String>) -> Self {
        Self {
            client,
            queue_name: queue_name.into(),
            _message: PhantomData,
        }
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    pub fn client(&self) -> &VmqClient {
        &self.client
    }

    pub fn id(&self) -> &str {
        self.client.id()
    }

    pub async fn close(&self) -> Result<()> {
        self.client.close().await
    }

    pub async fn ping(&self) -> Result<()> {
        self.client.ping().await
    }

    pub async fn publish(&self, message: &T) -> Result<()> {
        self.client.publish(&self.queue_name, message).await
    }

    pub async fn consume(&self) -> Result<Message<T>> {
        self.client.consume(&self.queue_name).await
    }

    pub async fn delete(&self, message_id: &MessageId) -> Result<()> {
        self.client.delete(&self.queue_name, message_id).await
    }
}

impl<T> Clone for QueueSession<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            queue_name: self.queue_name.clone(),
            _message: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for QueueSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueSession")
            .field("client", &self.client)
            .field("queue_name", &self.queue_name)
            .finish()
    }
}
