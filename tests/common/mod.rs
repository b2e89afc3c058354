//! In-process broker speaking the VMQ frame protocol, backed by in-memory
//! queues. Consume hands out the head of a queue without removing it; only
//! delete removes a message.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use ulid::Ulid;
use vmq_client::ConfigBuilder;

pub const USER_ID: &str = "01HG17X22440GTQW3AS6WHCF0K";
pub const PASSWORD: &str = "P@ssw0rd";

/// Answers the handshake with a session id that is not a ULID.
pub const REJECTED_USER: &str = "rejected";
/// Closes the socket without answering the handshake.
pub const HANGUP_USER: &str = "hangup";
/// Closes the socket right after a successful handshake.
pub const SEVERED_USER: &str = "severed";
/// Authenticates, then never answers a request.
pub const SILENT_USER: &str = "silent";
/// Authenticates, then answers ping and consume with truncated bodies.
pub const TRUNCATING_USER: &str = "truncating";

const CHAR: usize = 4;
const AUTH_LEN: usize = (32 + 64) * CHAR;
const SESSION_LEN: usize = 32 * CHAR;
const HEADER_LEN: usize = SESSION_LEN + 1 + 128 * CHAR + 8;

pub struct StoredQueue {
    pub name: String,
    pub messages: VecDeque<(String, Vec<u8>)>,
}

#[derive(Default)]
pub struct BrokerState {
    pub queues: Vec<StoredQueue>,
    pub rejected_and_closed: bool,
}

impl BrokerState {
    fn queue_mut(&mut self, name: &str) -> Result<&mut StoredQueue, String> {
        self.queues
            .iter_mut()
            .find(|q| q.name == name)
            .ok_or_else(|| format!("queue not found: {}", name))
    }
}

pub struct MockBroker {
    pub port: u16,
    pub state: Arc<Mutex<BrokerState>>,
}

impl MockBroker {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(Mutex::new(BrokerState::default()));

        let shared = state.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(serve(socket, shared.clone()));
            }
        });

        Self { port, state }
    }

    pub fn config(&self, user_id: &str) -> ConfigBuilder {
        ConfigBuilder::new()
            .host("127.0.0.1")
            .port(self.port)
            .user_id(user_id)
            .password(PASSWORD)
    }

    pub fn stored_payloads(&self, queue: &str) -> Vec<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state
            .queues
            .iter()
            .find(|q| q.name == queue)
            .map(|q| q.messages.iter().map(|(_, p)| p.clone()).collect())
            .unwrap_or_default()
    }

    pub fn queue_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.queues.iter().map(|q| q.name.clone()).collect()
    }
}

pub fn encode_text(value: &str, width: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(width * CHAR);
    for c in value.chars() {
        out.extend_from_slice(&(c as u32).to_be_bytes());
    }
    out.resize(width * CHAR, 0);
    out
}

pub fn decode_text(raw: &[u8]) -> String {
    raw.chunks(CHAR)
        .filter_map(|c| char::from_u32(u32::from_be_bytes([c[0], c[1], c[2], c[3]])))
        .collect::<String>()
        .trim_matches('\0')
        .to_string()
}

async fn serve(mut socket: TcpStream, state: Arc<Mutex<BrokerState>>) {
    let mut auth = [0u8; AUTH_LEN];
    if socket.read_exact(&mut auth).await.is_err() {
        return;
    }
    let user = decode_text(&auth[..SESSION_LEN]);
    let password = decode_text(&auth[SESSION_LEN..]);

    if user == HANGUP_USER {
        return;
    }
    if user == REJECTED_USER || password != PASSWORD {
        let _ = socket.write_all(&encode_text("authentication failed", 32)).await;
        let mut buf = [0u8; 1];
        if let Ok(0) = socket.read(&mut buf).await {
            state.lock().unwrap().rejected_and_closed = true;
        }
        return;
    }

    let session = Ulid::new().to_string();
    if socket.write_all(&encode_text(&session, 32)).await.is_err() {
        return;
    }
    if user == SEVERED_USER {
        return;
    }

    loop {
        let mut header = [0u8; HEADER_LEN];
        if socket.read_exact(&mut header).await.is_err() {
            return;
        }
        if user == SILENT_USER {
            let mut sink = Vec::new();
            let _ = socket.read_to_end(&mut sink).await;
            return;
        }

        let session_id = decode_text(&header[..SESSION_LEN]);
        let command = header[SESSION_LEN];
        let queue = decode_text(&header[SESSION_LEN + 1..HEADER_LEN - 8]);
        let size = u64::from_be_bytes(header[HEADER_LEN - 8..].try_into().unwrap()) as usize;

        let mut body = vec![0u8; size];
        if socket.read_exact(&mut body).await.is_err() {
            return;
        }

        let reply = if session_id != session {
            Err(format!("unknown session: {}", session_id))
        } else if user == TRUNCATING_USER && command == 2 {
            Ok(vec![0xab; 3])
        } else if user == TRUNCATING_USER && command == 7 {
            Ok(b"01HJXVRZ9Q".to_vec())
        } else {
            execute(&state, command, &queue, body)
        };

        let (code, bytes) = match reply {
            Ok(bytes) => (1u8, bytes),
            Err(message) => (2u8, message.into_bytes()),
        };
        let mut out = vec![code];
        out.extend_from_slice(&(bytes.len() as u64).to_be_bytes());
        out.extend_from_slice(&bytes);
        if socket.write_all(&out).await.is_err() {
            return;
        }
    }
}

fn execute(
    state: &Mutex<BrokerState>,
    command: u8,
    queue: &str,
    body: Vec<u8>,
) -> Result<Vec<u8>, String> {
    let mut state = state.lock().unwrap();
    match command {
        // ping
        2 => Ok(vec![0xab; 64]),
        // create queue
        3 => {
            if !state.queues.iter().any(|q| q.name == queue) {
                state.queues.push(StoredQueue {
                    name: queue.to_string(),
                    messages: VecDeque::new(),
                });
            }
            Ok(Vec::new())
        }
        // list queue
        4 => {
            let names: Vec<&str> = state.queues.iter().map(|q| q.name.as_str()).collect();
            Ok(serde_json::to_vec(&serde_json::json!({ "queues": names })).unwrap())
        }
        // delete queue
        5 => {
            let index = state
                .queues
                .iter()
                .position(|q| q.name == queue)
                .ok_or_else(|| format!("queue not found: {}", queue))?;
            state.queues.remove(index);
            Ok(Vec::new())
        }
        // publish
        6 => {
            let q = state.queue_mut(queue)?;
            q.messages.push_back((Ulid::new().to_string(), body));
            Ok(Vec::new())
        }
        // consume
        7 => {
            let q = state.queue_mut(queue)?;
            let (id, payload) = q.messages.front().ok_or("queue is empty")?;
            let mut out = id.as_bytes().to_vec();
            out.extend_from_slice(payload);
            Ok(out)
        }
        // delete message
        8 => {
            let id = String::from_utf8(body).map_err(|e| e.to_string())?;
            let q = state.queue_mut(queue)?;
            let index = q
                .messages
                .iter()
                .position(|(stored, _)| *stored == id)
                .ok_or_else(|| format!("message not found: {}", id))?;
            q.messages.remove(index);
            Ok(Vec::new())
        }
        other => Err(format!("unknown command: {}", other)),
    }
}
