//! CLI walkthrough of the to-do view model.
//!
//! Runs against Firestore when `FIRESTORE_PROJECT_ID` is set (the emulator
//! via `FIRESTORE_EMULATOR_HOST`), otherwise against an in-memory store.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use todo::{Config, TodoClient, TodoEnvironment};
use todo_client_core::environment::SystemClock;
use todo_client_core::todo_store::TodoStore;
use todo_client_firestore::FirestoreTodoStore;
use todo_client_testing::InMemoryTodoStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let config = Config::from_env().context("loading configuration")?;
    init_tracing(&config.client.log_level);

    let store: Arc<dyn TodoStore> = match &config.firestore {
        Some(firestore) => {
            tracing::info!(
                project = %firestore.project_id,
                collection = %firestore.collection,
                "Using Firestore"
            );
            Arc::new(FirestoreTodoStore::new(firestore.clone())?)
        },
        None => {
            tracing::info!("FIRESTORE_PROJECT_ID not set, using in-memory store");
            Arc::new(InMemoryTodoStore::new())
        },
    };

    println!("=== Todo ===\n");

    let client = TodoClient::start_with_timeout(
        TodoEnvironment::new(Arc::new(SystemClock), store),
        config.client.request_timeout(),
    )
    .await;
    print_items(&client, "Stored items").await;

    println!("\nCreating 'Buy milk'...");
    client.set_draft_title("Buy milk").await?;
    client.set_draft_details("2%, 1 gallon").await?;
    client.set_draft_due_date("2024-06-01T10:00").await?;
    let id = client.create().await?;
    print_items(&client, "After create").await;

    println!("\nEditing 'Buy milk'...");
    let item = client
        .items()
        .await
        .into_iter()
        .find(|item| item.id == id)
        .context("created item missing from reload")?;
    client.begin_edit(&item).await?;
    client.set_edit_title("Buy oat milk").await?;
    client.update().await?;
    print_items(&client, "After update").await;

    println!("\nDeleting it again...");
    client.delete(&id).await?;
    print_items(&client, "After delete").await;

    client.shutdown(Duration::from_secs(5)).await?;
    println!("\n=== Demo Complete ===");
    Ok(())
}

async fn print_items(client: &TodoClient, heading: &str) {
    let state = client.snapshot().await;
    println!("{heading}: {}", state.count());
    for row in state.rows() {
        println!("  [{}] {} - {} (due {})", row.id, row.title, row.details, row.due);
    }
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
