use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use vmq_client::VmqClient;

#[derive(Serialize, Deserialize, Debug)]
struct User {
    id: i64,
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = VmqClient::new("localhost", 9000, "01HG17X22440GTQW3AS6WHCF0K", "P@ssw0rd").await?;
    println!("Authenticated, session {}", client.id());

    println!("Checking broker liveness...");
    client.ping().await?;
    println!("✅ Broker is answering");

    for name in ["example queue1", "example queue2", "example queue3"] {
        client.create_queue(name).await?;
    }
    for (i, name) in client.list_queues().await?.iter().enumerate() {
        println!("{}: {}", i, name);
    }

    println!("\nPublishing a message...");
    let user = User {
        id: 1,
        name: "Jhon".to_string(),
    };
    client.publish("example queue1", &user).await?;

    println!("\nConsuming...");
    let msg = client.consume::<User>("example queue1").await?;
    println!("Got message {}: {:?}", msg.id, msg.data);

    println!("\nDeleting message {}...", msg.id);
    client.delete("example queue1", &msg.id).await?;

    for name in ["example queue1", "example queue2", "example queue3"] {
        client.delete_queue(name).await?;
    }

    client.close().await?;
    Ok(())
}
