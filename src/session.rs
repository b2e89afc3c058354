//! Transport session and the request/response engine.
//!
//! A [`Session`] owns one TCP connection and the identifier the broker issued
//! for it. Every command is a single exchange:
//!
//! 1. write `RequestHeader` + payload in one flush
//! 2. read the 9-byte `ResponseHeader`
//! 3. read exactly `data size` body bytes
//!
//! The connection sits behind an async mutex held for the whole exchange, so
//! only one request is ever in flight. The session is flagged as busy before
//! the write and cleared once the body is drained; if the exchange fails at the
//! transport level, or its future is dropped half way, the flag stays set and
//! every later call fails with [`VmqError::ConnectionUnusable`].
//!
//! Closing does not wait behind an exchange stuck on a silent broker: `close`
//! raises a shutdown signal first, which aborts the in-flight exchange and
//! releases the lock.

use std::future::Future;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};
use tokio::time::timeout;

use crate::codec::Payload;
use crate::config::Config;
use crate::error::{Result, VmqError};
use crate::wire::{
    AuthField, Command, RequestHeader, ResponseHeader, ResultCode, SessionId, REQUEST_HEADER_LEN,
    RESPONSE_HEADER_LEN, SESSION_ID_LEN,
};

pub(crate) struct Session {
    id: SessionId,
    conn: Mutex<Connection>,
    closed: watch::Sender<bool>,
    request_timeout: Option<Duration>,
    max_frame_size: u64,
}

struct Connection {
    /// `None` once closed or torn down after a fatal error.
    stream: Option<TcpStream>,
    /// Set while a response may still be pending on the socket.
    desynced: bool,
}

impl Connection {
    /// Hands out the stream for one exchange and marks the connection busy.
    fn begin(&mut self) -> Result<&mut TcpStream> {
        if self.desynced {
            return Err(VmqError::ConnectionUnusable);
        }
        let stream = self.stream.as_mut().ok_or(VmqError::ConnectionUnusable)?;
        self.desynced = true;
        Ok(stream)
    }

    async fn tear_down(&mut self) {
        self.desynced = true;
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
    }
}

impl Session {
    /// Dials the broker and performs the authentication handshake.
    ///
    /// Credentials are checked against their slot widths before anything is
    /// dialled. If the handshake fails the socket is shut down before the
    /// error is returned.
    pub async fn connect(config: &Config) -> Result<Self> {
        let auth = AuthField {
            account_id: &config.user_id,
            password: &config.password,
        }
        .encode()?;

        let addr = config.addr();
        let mut stream = timeout(config.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| VmqError::Timeout(config.connect_timeout.as_millis() as u64))?
            .map_err(|e| VmqError::Connection(format!("{}: {}", addr, e)))?;
        stream.set_nodelay(true)?;

        let id = match with_deadline(config.request_timeout, handshake(&mut stream, &auth)).await
        {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Handshake with {} failed: {}", addr, e);
                let _ = stream.shutdown().await;
                return Err(e);
            }
        };

        tracing::debug!("Authenticated session {} on {}", id, addr);

        Ok(Self {
            id,
            conn: Mutex::new(Connection {
                stream: Some(stream),
                desynced: false,
            }),
            closed: watch::channel(false).0,
            request_timeout: config.request_timeout,
            max_frame_size: config.max_frame_size,
        })
    }

    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Shuts the connection down. Closing an already closed session is a no-op.
    pub async fn close(&self) -> Result<()> {
        self.closed.send_replace(true);
        let mut conn = self.conn.lock().await;
        conn.desynced = true;
        if let Some(mut stream) = conn.stream.take() {
            tracing::debug!("Closing session {}", self.id);
            stream.shutdown().await?;
        }
        Ok(())
    }

    /// Performs one request/response exchange and returns the response body.
    ///
    /// A broker error reply is returned as [`VmqError::Server`] carrying the
    /// broker's message; the connection stays usable in that case.
    pub async fn request(&self, queue_name: &str, command: Command, payload: Payload) -> Result<Bytes> {
        let body = payload.into_bytes();

        let mut frame = BytesMut::with_capacity(REQUEST_HEADER_LEN + body.len());
        RequestHeader {
            session_id: &self.id,
            command,
            queue_name,
            data_size: body.len() as u64,
        }
        .encode_into(&mut frame)?;
        frame.extend_from_slice(&body);

        let mut closed = self.closed.subscribe();
        let mut conn = self.conn.lock().await;
        let outcome = {
            let stream = conn.begin()?;
            tracing::debug!(
                "Request {} queue={:?} payload={}B session={}",
                command,
                queue_name,
                body.len(),
                self.id
            );
            tokio::select! {
                outcome = with_deadline(
                    self.request_timeout,
                    exchange(stream, &frame, self.max_frame_size),
                ) => outcome,
                _ = closed.wait_for(|closed| *closed) => Err(VmqError::ConnectionUnusable),
            }
        };

        match &outcome {
            Ok(_) | Err(VmqError::Server { .. }) => conn.desynced = false,
            Err(e) => {
                tracing::warn!("Session {} is no longer usable: {}", self.id, e);
                conn.tear_down().await;
            }
        }

        outcome
    }

    /// Tears the connection down after the caller found a drained response
    /// unacceptable, and hands `err` back.
    pub async fn abandon(&self, err: VmqError) -> VmqError {
        tracing::warn!("Session {} is no longer usable: {}", self.id, err);
        self.conn.lock().await.tear_down().await;
        err
    }
}

/// Writes the credentials and reads back the session identifier.
async fn handshake<S>(stream: &mut S, auth: &[u8]) -> Result<SessionId>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(auth).await?;
    stream.flush().await?;

    let mut raw = [0u8; SESSION_ID_LEN];
    stream
        .read_exact(&mut raw)
        .await
        .map_err(|e| VmqError::Authentication(format!("no session id from broker: {}", e)))?;

    SessionId::decode(raw)
}

async fn exchange<S>(stream: &mut S, frame: &[u8], max_frame_size: u64) -> Result<Bytes>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(frame).await?;
    stream.flush().await?;
    tracing::trace!("Wrote {} byte frame", frame.len());

    let mut raw = [0u8; RESPONSE_HEADER_LEN];
    stream.read_exact(&mut raw).await?;
    let header = ResponseHeader::decode(&raw)?;
    tracing::debug!(
        "Response {:?} with {} byte body",
        header.result,
        header.data_size
    );

    if header.data_size > max_frame_size {
        return Err(VmqError::Protocol(format!(
            "Response body too large: {} bytes (max {})",
            header.data_size, max_frame_size
        )));
    }

    let mut body = vec![0u8; header.data_size as usize];
    stream.read_exact(&mut body).await?;

    match header.result {
        ResultCode::Ok => Ok(Bytes::from(body)),
        ResultCode::Error => Err(VmqError::Server {
            message: String::from_utf8_lossy(&body).into_owned(),
        }),
    }
}

async fn with_deadline<T, F>(limit: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => timeout(limit, fut)
            .await
            .map_err(|_| VmqError::Timeout(limit.as_millis() as u64))?,
        None => fut.await,
    }
}
