//! In-memory document store for fast, deterministic tests.
//!
//! [`InMemoryTodoStore`] honours the same contract as the Firestore adapter:
//! ids are generated on create, update and delete fail with `NotFound` for an
//! unknown id, and updates never touch `created_at`. On top of that it can be
//! told to fail (everything, or just the next listing), to delay individual
//! list calls, and it counts every call so a test can assert that no write
//! happened.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only follows a panicking test

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use todo_client_core::todo::{NewTodo, TodoFields, TodoId, TodoItem};
use todo_client_core::todo_store::{StoreFuture, TodoStore, TodoStoreError};

/// Number of calls received per operation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `list_all` calls
    pub list_all: usize,
    /// `create` calls
    pub create: usize,
    /// `update` calls
    pub update: usize,
    /// `delete` calls
    pub delete: usize,
}

impl CallCounts {
    /// Total write calls (create, update, delete), failed ones included
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.create + self.update + self.delete
    }
}

#[derive(Debug, Default)]
struct Inner {
    /// Items in insertion order
    items: Vec<TodoItem>,
    next_id: u64,
    unavailable: bool,
    failing_lists: usize,
    list_delays: VecDeque<Duration>,
    calls: CallCounts,
}

/// `Vec`-backed document store.
///
/// Cloning shares the underlying collection.
///
/// # Example
///
/// ```
/// use todo_client_testing::InMemoryTodoStore;
/// use todo_client_core::todo::{Draft, NewTodo};
/// use todo_client_core::todo_store::TodoStore;
/// use chrono::Utc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryTodoStore::new();
/// let fields = Draft::new("Buy milk", "2%, 1 gallon", "2024-06-01T10:00").validate()?;
/// let id = store.create(NewTodo::new(fields, Utc::now())).await?;
///
/// assert!(store.contains(&id));
/// assert_eq!(store.calls().create, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryTodoStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryTodoStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with items (calls are not counted)
    #[must_use]
    pub fn with_items(items: impl IntoIterator<Item = TodoItem>) -> Self {
        let store = Self::new();
        store.inner.write().unwrap().items.extend(items);
        store
    }

    /// Make every subsequent call fail with `Unavailable` until reset
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.write().unwrap().unavailable = unavailable;
    }

    /// Make the next `list_all` call fail with `Unavailable`; writes keep working
    pub fn fail_next_list(&self) {
        self.inner.write().unwrap().failing_lists += 1;
    }

    /// Delay the next `list_all` call.
    ///
    /// The collection is read before the delay, so a delayed call returns the
    /// data as it was when the call was issued.
    pub fn delay_next_list(&self, delay: Duration) {
        self.inner.write().unwrap().list_delays.push_back(delay);
    }

    /// Snapshot of the stored items in insertion order
    #[must_use]
    pub fn items(&self) -> Vec<TodoItem> {
        self.inner.read().unwrap().items.clone()
    }

    /// Look up one item
    #[must_use]
    pub fn get(&self, id: &TodoId) -> Option<TodoItem> {
        self.inner
            .read()
            .unwrap()
            .items
            .iter()
            .find(|item| &item.id == id)
            .cloned()
    }

    /// Check if an item exists
    #[must_use]
    pub fn contains(&self, id: &TodoId) -> bool {
        self.get(id).is_some()
    }

    /// Number of stored items
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().items.len()
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls received so far
    #[must_use]
    pub fn calls(&self) -> CallCounts {
        self.inner.read().unwrap().calls
    }

    fn check_available(inner: &Inner) -> Result<(), TodoStoreError> {
        if inner.unavailable {
            Err(TodoStoreError::Unavailable(
                "in-memory store set unavailable".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

impl TodoStore for InMemoryTodoStore {
    fn list_all(&self) -> StoreFuture<'_, Vec<TodoItem>> {
        Box::pin(async move {
            let (result, delay) = {
                let mut inner = self.inner.write().unwrap();
                inner.calls.list_all += 1;
                let delay = inner.list_delays.pop_front();
                let result = if inner.failing_lists > 0 {
                    inner.failing_lists -= 1;
                    Err(TodoStoreError::Unavailable("injected list failure".to_string()))
                } else {
                    Self::check_available(&inner).map(|()| inner.items.clone())
                };
                (result, delay)
            };

            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        })
    }

    fn create(&self, todo: NewTodo) -> StoreFuture<'_, TodoId> {
        Box::pin(async move {
            let mut inner = self.inner.write().unwrap();
            inner.calls.create += 1;
            Self::check_available(&inner)?;

            inner.next_id += 1;
            let id = TodoId::new(format!("todo-{}", inner.next_id));
            inner.items.push(TodoItem::from_new(id.clone(), todo));
            Ok(id)
        })
    }

    fn update<'a>(&'a self, id: &'a TodoId, fields: TodoFields) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut inner = self.inner.write().unwrap();
            inner.calls.update += 1;
            Self::check_available(&inner)?;

            let item = inner
                .items
                .iter_mut()
                .find(|item| &item.id == id)
                .ok_or_else(|| TodoStoreError::NotFound(id.clone()))?;
            item.apply(fields);
            Ok(())
        })
    }

    fn delete<'a>(&'a self, id: &'a TodoId) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut inner = self.inner.write().unwrap();
            inner.calls.delete += 1;
            Self::check_available(&inner)?;

            let position = inner
                .items
                .iter()
                .position(|item| &item.id == id)
                .ok_or_else(|| TodoStoreError::NotFound(id.clone()))?;
            inner.items.remove(position);
            Ok(())
        })
    }
}
