//! `TodoClient`: the view model handed to the presentation layer.
//!
//! Wraps the runtime [`Store`] and turns each user intent into a command plus
//! a wait for its correlated outcome, so every mutation reports a typed
//! result instead of only logging.

use crate::reducer::{TodoEnvironment, TodoReducer};
use crate::types::{RequestId, TodoAction, TodoState};
use std::time::Duration;
use thiserror::Error;
use todo_client_core::todo::{Draft, TodoId, TodoItem, ValidationError};
use todo_client_core::todo_store::TodoStoreError;
use todo_client_runtime::{Store, StoreError};
use tokio::sync::broadcast;

/// Default time to wait for the outcome of a request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure of a view model operation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClientError {
    /// Form values were rejected; nothing was sent
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The store call failed
    #[error(transparent)]
    Store(#[from] TodoStoreError),

    /// An edit operation was requested with no item being edited
    #[error("no item is being edited")]
    NotEditing,

    /// The runtime could not deliver the outcome
    #[error("runtime error: {0}")]
    Runtime(#[from] StoreError),
}

type TodoRuntime = Store<TodoState, TodoAction, TodoEnvironment, TodoReducer>;

/// To-do list view model.
///
/// Cloning yields another handle to the same state.
///
/// # Example
///
/// ```no_run
/// use todo::TodoClient;
/// use todo::reducer::TodoEnvironment;
/// use todo_client_core::environment::SystemClock;
/// # use todo_client_core::todo_store::TodoStore;
/// use std::sync::Arc;
///
/// # async fn example(store: Arc<dyn TodoStore>) -> Result<(), todo::ClientError> {
/// let client = TodoClient::start(TodoEnvironment::new(Arc::new(SystemClock), store)).await;
///
/// client.set_draft_title("Buy milk").await?;
/// client.set_draft_details("2%, 1 gallon").await?;
/// client.set_draft_due_date("2024-06-01T10:00").await?;
/// let id = client.create().await?;
///
/// assert!(client.items().await.iter().any(|item| item.id == id));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TodoClient {
    store: TodoRuntime,
    timeout: Duration,
}

impl TodoClient {
    /// Creates a client with empty state; nothing is fetched yet
    #[must_use]
    pub fn new(environment: TodoEnvironment) -> Self {
        Self {
            store: Store::new(TodoState::new(), TodoReducer::new(), environment),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Creates a client and performs the initial load.
    ///
    /// A failed initial load is logged and leaves the list empty; the client
    /// is usable either way.
    pub async fn start(environment: TodoEnvironment) -> Self {
        Self::start_with_timeout(environment, DEFAULT_REQUEST_TIMEOUT).await
    }

    /// Like [`TodoClient::start`], with `timeout` applied from the initial
    /// load onwards
    pub async fn start_with_timeout(environment: TodoEnvironment, timeout: Duration) -> Self {
        let client = Self::new(environment).with_timeout(timeout);
        if let Err(error) = client.refresh().await {
            tracing::warn!(%error, "Initial load failed");
        }
        client
    }

    /// Sets how long operations wait for their outcome
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reloads the whole collection.
    ///
    /// On failure the previous items are kept.
    ///
    /// # Errors
    ///
    /// [`ClientError::Store`] if the store call failed, [`ClientError::Runtime`]
    /// if no outcome arrived in time.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let request_id = RequestId::new();
        let outcome = self.request(TodoAction::Refresh { request_id }).await?;

        match outcome.last() {
            Some(TodoAction::RefreshFailed { error, .. }) => Err(error.clone().into()),
            _ => Ok(()),
        }
    }

    /// Replaces the entry form
    ///
    /// # Errors
    ///
    /// [`ClientError::Runtime`] if the client is shut down.
    pub async fn set_draft(&self, draft: Draft) -> Result<(), ClientError> {
        self.apply(TodoAction::SetDraft { draft }).await
    }

    /// Edits the entry form title
    ///
    /// # Errors
    ///
    /// [`ClientError::Runtime`] if the client is shut down.
    pub async fn set_draft_title(&self, title: impl Into<String>) -> Result<(), ClientError> {
        self.apply(TodoAction::SetDraftTitle { title: title.into() }).await
    }

    /// Edits the entry form details
    ///
    /// # Errors
    ///
    /// [`ClientError::Runtime`] if the client is shut down.
    pub async fn set_draft_details(&self, details: impl Into<String>) -> Result<(), ClientError> {
        self.apply(TodoAction::SetDraftDetails {
            details: details.into(),
        })
        .await
    }

    /// Edits the entry form due date
    ///
    /// # Errors
    ///
    /// [`ClientError::Runtime`] if the client is shut down.
    pub async fn set_draft_due_date(&self, due_date: impl Into<String>) -> Result<(), ClientError> {
        self.apply(TodoAction::SetDraftDueDate {
            due_date: due_date.into(),
        })
        .await
    }

    /// Submits the entry form.
    ///
    /// Resolves after the follow-up reload has been applied. The draft is
    /// cleared on success and kept on failure. A failed reload after a
    /// successful create is logged and does not fail the call.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Validation`]: a field is blank or the due date does not parse
    /// - [`ClientError::Store`]: the store rejected or could not take the write
    /// - [`ClientError::Runtime`]: no outcome in time, or the client is shut down
    pub async fn create(&self) -> Result<TodoId, ClientError> {
        let request_id = RequestId::new();
        let outcome = self.request(TodoAction::Create { request_id }).await?;

        let mut created = None;
        for action in outcome {
            match action {
                TodoAction::Created { id, .. } => created = Some(id),
                TodoAction::CreateFailed { error, .. } => return Err(error.into()),
                TodoAction::ValidationFailed { error, .. } => return Err(error.into()),
                TodoAction::RefreshFailed { error, .. } => {
                    tracing::warn!(%request_id, %error, "Created, but reload failed");
                },
                _ => {},
            }
        }

        created.ok_or(ClientError::Runtime(StoreError::ChannelClosed))
    }

    /// Opens the edit dialog on a copy of `item`
    ///
    /// # Errors
    ///
    /// [`ClientError::Runtime`] if the client is shut down.
    pub async fn begin_edit(&self, item: &TodoItem) -> Result<(), ClientError> {
        self.apply(TodoAction::BeginEdit { item: item.clone() }).await
    }

    /// Edits the dialog title
    ///
    /// # Errors
    ///
    /// [`ClientError::NotEditing`] if the dialog is closed.
    pub async fn set_edit_title(&self, title: impl Into<String>) -> Result<(), ClientError> {
        self.apply_edit(TodoAction::SetEditTitle { title: title.into() }).await
    }

    /// Edits the dialog details
    ///
    /// # Errors
    ///
    /// [`ClientError::NotEditing`] if the dialog is closed.
    pub async fn set_edit_details(&self, details: impl Into<String>) -> Result<(), ClientError> {
        self.apply_edit(TodoAction::SetEditDetails {
            details: details.into(),
        })
        .await
    }

    /// Edits the dialog due date
    ///
    /// # Errors
    ///
    /// [`ClientError::NotEditing`] if the dialog is closed.
    pub async fn set_edit_due_date(&self, due_date: impl Into<String>) -> Result<(), ClientError> {
        self.apply_edit(TodoAction::SetEditDueDate {
            due_date: due_date.into(),
        })
        .await
    }

    /// Saves the edit dialog.
    ///
    /// Only title, details and due date are sent. On success the dialog
    /// closes and the call resolves after the follow-up reload; on failure
    /// the dialog stays open with the unsaved values.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NotEditing`]: no dialog is open
    /// - [`ClientError::Validation`]: a field is blank or the due date does not parse
    /// - [`ClientError::Store`]: the update failed, e.g. the item no longer exists
    /// - [`ClientError::Runtime`]: no outcome in time, or the client is shut down
    pub async fn update(&self) -> Result<(), ClientError> {
        let request_id = RequestId::new();
        let outcome = self.request(TodoAction::SaveEdit { request_id }).await?;

        for action in outcome {
            match action {
                TodoAction::EditNotOpen { .. } => return Err(ClientError::NotEditing),
                TodoAction::UpdateFailed { error, .. } => return Err(error.into()),
                TodoAction::ValidationFailed { error, .. } => return Err(error.into()),
                TodoAction::RefreshFailed { error, .. } => {
                    tracing::warn!(%request_id, %error, "Updated, but reload failed");
                },
                _ => {},
            }
        }
        Ok(())
    }

    /// Closes the edit dialog without saving. No store call is made.
    ///
    /// # Errors
    ///
    /// [`ClientError::Runtime`] if the client is shut down.
    pub async fn cancel_edit(&self) -> Result<(), ClientError> {
        self.apply(TodoAction::CancelEdit).await
    }

    /// Deletes an item and reloads.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Store`]: the delete failed; [`TodoStoreError::NotFound`] for an unknown id
    /// - [`ClientError::Runtime`]: no outcome in time, or the client is shut down
    pub async fn delete(&self, id: &TodoId) -> Result<(), ClientError> {
        let request_id = RequestId::new();
        let outcome = self
            .request(TodoAction::Delete {
                request_id,
                id: id.clone(),
            })
            .await?;

        for action in outcome {
            match action {
                TodoAction::DeleteFailed { error, .. } => return Err(error.into()),
                TodoAction::RefreshFailed { error, .. } => {
                    tracing::warn!(%request_id, %error, "Deleted, but reload failed");
                },
                _ => {},
            }
        }
        Ok(())
    }

    /// Current items in store enumeration order
    pub async fn items(&self) -> Vec<TodoItem> {
        self.store.state(|state| state.items.clone()).await
    }

    /// Copy of the whole view state
    pub async fn snapshot(&self) -> TodoState {
        self.store.state(Clone::clone).await
    }

    /// Observe every outcome event as it is applied
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TodoAction> {
        self.store.subscribe_actions()
    }

    /// Stops accepting operations and waits for running store calls
    ///
    /// # Errors
    ///
    /// [`ClientError::Runtime`] if calls are still running after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), ClientError> {
        self.store.shutdown(timeout).await?;
        Ok(())
    }

    /// Sends a local-state command
    async fn apply(&self, action: TodoAction) -> Result<(), ClientError> {
        self.store.send(action).await?;
        Ok(())
    }

    async fn apply_edit(&self, action: TodoAction) -> Result<(), ClientError> {
        if !self.store.state(|state| state.edit.is_open()).await {
            return Err(ClientError::NotEditing);
        }
        self.apply(action).await
    }

    /// Sends a request-carrying command and collects its outcome events
    async fn request(&self, action: TodoAction) -> Result<Vec<TodoAction>, ClientError> {
        let request_id = action.request_id();
        let outcome = self
            .store
            .send_and_collect(
                action,
                |event| event.request_id() == request_id,
                TodoAction::is_terminal,
                self.timeout,
            )
            .await?;
        Ok(outcome)
    }
}
