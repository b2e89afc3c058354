use std::time::Duration;

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;
use vmq_client::{VmqClient, VmqError};

#[derive(Serialize, Deserialize, Debug)]
struct Task {
    id: u64,
    body: String,
}

/// Anything that is not a `Task` still decodes, so its id can be deleted.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum Incoming {
    Task(Task),
    Unknown(IgnoredAny),
}

const QUEUE: &str = "tasks";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = VmqClient::builder()
        .host("localhost")
        .port(9000)
        .user_id("01HG17X22440GTQW3AS6WHCF0K")
        .password("P@ssw0rd")
        .request_timeout_ms(5000)
        .build();

    let mut client = VmqClient::connect(&config).await?;

    println!("Starting worker, polling for messages...");

    loop {
        match client.consume::<Incoming>(QUEUE).await {
            Ok(message) => {
                match message.data {
                    Incoming::Task(task) => {
                        println!("Processing message {}: {}", message.id, task.body);
                        match process_task(&task).await {
                            Ok(_) => println!("✅ Successfully processed message {}", message.id),
                            Err(e) => println!("❌ Failed to process message {}: {}", message.id, e),
                        }
                    }
                    Incoming::Unknown(_) => {
                        println!("Dropping message {}: not a task", message.id);
                    }
                }
                client.delete(QUEUE, &message.id).await?;
            }
            Err(e) if e.is_connection_fatal() => {
                println!("Connection lost ({}), reconnecting...", e);
                let _ = client.close().await;
                sleep(Duration::from_secs(5)).await;
                client = VmqClient::connect(&config).await?;
            }
            Err(VmqError::Server { message }) => {
                println!("Broker says: {}, waiting...", message);
                sleep(Duration::from_secs(1)).await;
            }
            Err(e) => {
                println!("Consume failed: {}", e);
                sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

async fn process_task(task: &Task) -> Result<(), String> {
    println!("  Processing task #{}: {}", task.id, task.body);
    sleep(Duration::from_millis(100)).await;

    if task.body.contains("error") {
        Err("Task body contains 'error'".to_string())
    } else {
        Ok(())
    }
}
