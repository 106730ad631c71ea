//! # Firestore Todo Store
//!
//! [`TodoStore`](todo_client_core::todo_store::TodoStore) implementation backed by
//! the Cloud Firestore REST API (`v1`). Works against production Firestore and
//! against the local emulator.
//!
//! ## Example
//!
//! ```no_run
//! use todo_client_firestore::FirestoreTodoStore;
//! use todo_client_core::todo_store::TodoStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads FIRESTORE_PROJECT_ID, FIRESTORE_API_KEY, ...
//!     let store = FirestoreTodoStore::from_env()?;
//!
//!     for item in store.list_all().await? {
//!         println!("{} {}", item.id, item.title);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Storage layout
//!
//! One document per item in a single collection (`todos` by default). Fields
//! `title`, `details`, `dueDate` and `createdAt` are string values; the item id
//! is the document id.

pub mod client;
pub mod config;
pub mod document;
pub mod error;

// Re-export main types for convenience
pub use client::FirestoreTodoStore;
pub use config::FirestoreConfig;
pub use error::FirestoreError;
