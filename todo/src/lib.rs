//! To-do list view model backed by a remote document store.
//!
//! The view keeps a disposable copy of the collection and rebuilds it after
//! every write:
//!
//! - Entry form (`draft`) submitted with [`TodoClient::create`]
//! - Edit dialog opened with [`TodoClient::begin_edit`], saved with
//!   [`TodoClient::update`] or discarded with [`TodoClient::cancel_edit`]
//! - [`TodoClient::delete`] by id
//! - Each successful write followed by one full reload
//!
//! Store failures are logged and returned as [`ClientError`]; they never
//! leave partial changes in the view state.
//!
//! # Quick Start
//!
//! ```no_run
//! use todo::{TodoClient, TodoEnvironment};
//! use todo_client_core::environment::SystemClock;
//! use todo_client_firestore::FirestoreTodoStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(FirestoreTodoStore::from_env()?);
//! let client = TodoClient::start(TodoEnvironment::new(Arc::new(SystemClock), store)).await;
//!
//! for row in client.snapshot().await.rows() {
//!     println!("{} ({})", row.title, row.due);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod reducer;
pub mod types;

// Re-export commonly used types
pub use client::{ClientError, TodoClient};
pub use config::Config;
pub use reducer::{TodoEnvironment, TodoReducer};
pub use types::{EditDialog, EditingItem, RequestId, TodoAction, TodoState};
