use std::fmt;
use std::time::Duration;

/// Default cap on a single response body, in bytes.
pub const DEFAULT_MAX_FRAME_SIZE: u64 = 16 * 1024 * 1024;

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub user_id: String,
    pub password: String,
    /// Queue bound by [`QueueSession`](crate::QueueSession). Ignored by [`VmqClient`](crate::VmqClient).
    pub queue_name: Option<String>,
    /// Bounds the TCP dial only.
    pub connect_timeout: Duration,
    /// Deadline for one handshake or request/response exchange. On expiry the
    /// connection is shut down and the session becomes unusable.
    pub request_timeout: Option<Duration>,
    pub max_frame_size: u64,
}

impl Config {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 9000,
            user_id: String::new(),
            password: String::new(),
            queue_name: None,
            connect_timeout: Duration::from_secs(30),
            request_timeout: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user_id", &self.user_id)
            .field("password", &"<redacted>")
            .field("queue_name", &self.queue_name)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("max_frame_size", &self.max_frame_size)
            .finish()
    }
}

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.config.user_id = user_id.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = password.into();
        self
    }

    pub fn queue_name(mut self, queue_name: impl Into<String>) -> Self {
        self.config.queue_name = Some(queue_name.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout = Duration::from_millis(ms);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.request_timeout = Some(Duration::from_millis(ms));
        self
    }

    pub fn max_frame_size(mut self, bytes: u64) -> Self {
        self.config.max_frame_size = bytes;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
