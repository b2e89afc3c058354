use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use vmq_client::{ConfigBuilder, QueueSession};

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

    let config = ConfigBuilder::new()
        .host("localhost")
        .port(9000)
        .user_id("01HG17X22440GTQW3AS6WHCF0K")
        .password("P@ssw0rd")
        .queue_name("example queue")
        .build();

    let users = QueueSession::<User>::connect(&config).await?;
    println!("Session {} bound to {:?}", users.id(), users.queue_name());

    users.client().create_queue(users.queue_name()).await?;

    users.publish(&User { id: 1, name: "Jhon".to_string() }).await?;
    users.publish(&User { id: 2, name: "Harry".to_string() }).await?;

    for _ in 0..2 {
        let msg = users.consume().await?;
        println!("msg: {} {:?}", msg.id, msg.data);
        users.delete(&msg.id).await?;
    }

    users.client().delete_queue(users.queue_name()).await?;
    users.close().await?;
    Ok(())
}
