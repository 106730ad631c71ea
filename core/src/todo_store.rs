//! Document store contract for to-do items.
//!
//! The store is the sole authority over items: the client never keeps a copy
//! it trusts, it re-reads the whole collection after every successful write.
//!
//! # Implementations
//!
//! - `FirestoreTodoStore` (in `todo-client-firestore`): Cloud Firestore REST API
//! - `InMemoryTodoStore` (in `todo-client-testing`): `HashMap`-backed, for tests
//!
//! # Example
//!
//! ```no_run
//! use todo_client_core::todo::{Draft, NewTodo};
//! use todo_client_core::todo_store::{TodoStore, TodoStoreError};
//! use todo_client_core::Utc;
//!
//! async fn example(store: &dyn TodoStore) -> Result<(), Box<dyn std::error::Error>> {
//!     let fields = Draft::new("Buy milk", "2%, 1 gallon", "2024-06-01T10:00").validate()?;
//!     let id = store.create(NewTodo::new(fields, Utc::now())).await?;
//!
//!     let items = store.list_all().await?;
//!     assert!(items.iter().any(|item| item.id == id));
//!
//!     store.delete(&id).await?;
//!     assert!(matches!(store.delete(&id).await, Err(TodoStoreError::NotFound(_))));
//!     Ok(())
//! }
//! ```

use crate::todo::{NewTodo, TodoFields, TodoId, TodoItem};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by [`TodoStore`] methods
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TodoStoreError>> + Send + 'a>>;

/// Errors surfaced by a document store.
///
/// Payloads are strings so the error can travel inside cloneable actions.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum TodoStoreError {
    /// The store could not be reached (connection, timeout, DNS).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The referenced item does not exist.
    #[error("todo not found: {0}")]
    NotFound(TodoId),

    /// The store answered with an error status.
    #[error("store rejected request (status {status}): {message}")]
    Rejected {
        /// Status code reported by the store
        status: u16,
        /// Error body reported by the store
        message: String,
    },

    /// A stored document could not be decoded into an item.
    #[error("malformed document: {0}")]
    Malformed(String),
}

impl TodoStoreError {
    /// True for connection-level failures
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// True when the target item is missing
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Remote collection of to-do items keyed by store-generated ids.
///
/// # Dyn Compatibility
///
/// Methods return boxed futures instead of using `async fn` so the store can be
/// held as `Arc<dyn TodoStore>` and captured by reducer effects.
pub trait TodoStore: Send + Sync {
    /// Enumerates every item in the collection.
    ///
    /// Order is whatever the store yields and may differ between calls.
    ///
    /// # Errors
    ///
    /// - `Unavailable`: the store could not be reached
    /// - `Malformed`: a document could not be decoded
    fn list_all(&self) -> StoreFuture<'_, Vec<TodoItem>>;

    /// Persists a new item and returns its generated id.
    ///
    /// # Errors
    ///
    /// - `Unavailable`: the store could not be reached
    /// - `Rejected`: the store refused the write
    fn create(&self, todo: NewTodo) -> StoreFuture<'_, TodoId>;

    /// Replaces title, details and due date of an existing item.
    ///
    /// The creation timestamp is not part of the payload and never changes.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no item has this id
    /// - `Unavailable`: the store could not be reached
    fn update<'a>(&'a self, id: &'a TodoId, fields: TodoFields) -> StoreFuture<'a, ()>;

    /// Removes an item.
    ///
    /// Not idempotent: deleting an id that does not exist is an error.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no item has this id
    /// - `Unavailable`: the store could not be reached
    fn delete<'a>(&'a self, id: &'a TodoId) -> StoreFuture<'a, ()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        assert_eq!(
            TodoStoreError::NotFound(TodoId::new("abc")).to_string(),
            "todo not found: abc"
        );
        assert_eq!(
            TodoStoreError::Rejected {
                status: 403,
                message: "denied".to_string()
            }
            .to_string(),
            "store rejected request (status 403): denied"
        );
    }

    #[test]
    fn error_classification() {
        assert!(TodoStoreError::Unavailable("down".to_string()).is_unavailable());
        assert!(TodoStoreError::NotFound(TodoId::new("x")).is_not_found());
        assert!(!TodoStoreError::Malformed("x".to_string()).is_not_found());
    }
}
