//! # VMQ Rust Client
//!
//! An async client for the VMQ message queue broker's binary TCP protocol.
//!
//! A client opens one connection, authenticates, and then issues one
//! request/response command at a time: ping, create/list/delete queue,
//! publish, consume and delete-message.
//!
//! ## Quick Start
//!
//! ```no_run
//! use serde::{Deserialize, Serialize};
//! use vmq_client::VmqClient;
//!
//! #[derive(Serialize, Deserialize, Debug)]
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = VmqClient::new("localhost", 9000, "01HG17X22440GTQW3AS6WHCF0K", "P@ssw0rd").await?;
//!     println!("Session: {}", client.id());
//!
//!     client.create_queue("example queue").await?;
//!     client.publish("example queue", &User { id: 1, name: "Jhon".into() }).await?;
//!
//!     let msg = client.consume::<User>("example queue").await?;
//!     println!("{}: {:?}", msg.id, msg.data);
//!
//!     // Acknowledge by deleting
//!     client.delete("example queue", &msg.id).await?;
//!     client.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Async/await support** - Built on Tokio
//! - **Typed payloads** - Any `serde` record, sent as named-field MessagePack
//! - **Queue sessions** - [`QueueSession`] binds a queue and a message type
//! - **Framing safety** - One request in flight per connection; a connection
//!   whose framing is lost refuses further use instead of misreading replies
//! - **Builder pattern** - Flexible configuration with [`ConfigBuilder`]
//!
//! The client never retries and never reconnects on its own. Errors for which
//! [`VmqError::is_connection_fatal`] is true mean the client must be closed and
//! a new one connected.
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (handshake, each request and response
//! header, connection teardown). It never logs credentials or payloads and does
//! not install a subscriber.

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod message;
pub mod queue;
mod session;
mod wire;

pub use client::VmqClient;
pub use config::{Config, ConfigBuilder};
pub use error::{Result, VmqError};
pub use message::{Message, MessageId};
pub use queue::QueueSession;
