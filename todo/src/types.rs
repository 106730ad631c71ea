//! State and actions of the to-do list view.
//!
//! The view holds a disposable copy of the stored collection, the entry form,
//! and the edit dialog. Every change to the collection goes through the
//! store and is followed by a full reload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use todo_client_core::todo::{Draft, TodoId, TodoItem, TodoRow, ValidationError};
use todo_client_core::todo_store::TodoStoreError;
use uuid::Uuid;

/// Correlates a command with the outcome events it leads to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new random `RequestId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The item open in the edit dialog, with its unsaved form values
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditingItem {
    /// Item being edited
    pub id: TodoId,
    /// Creation time of the item; shown, never submitted
    pub created_at: DateTime<Utc>,
    /// Edited values
    pub form: Draft,
}

impl EditingItem {
    /// Copies an item into an editable form
    #[must_use]
    pub fn from_item(item: &TodoItem) -> Self {
        Self {
            id: item.id.clone(),
            created_at: item.created_at,
            form: Draft::from_item(item),
        }
    }
}

/// Edit dialog: closed, or open on one item
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditDialog {
    /// No dialog shown
    #[default]
    Closed,
    /// Dialog shown for an item
    Open(EditingItem),
}

impl EditDialog {
    /// Whether the dialog is shown
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }

    /// The item being edited, if any
    #[must_use]
    pub const fn editing(&self) -> Option<&EditingItem> {
        match self {
            Self::Open(editing) => Some(editing),
            Self::Closed => None,
        }
    }
}

/// Refresh bookkeeping.
///
/// Every reload is numbered when issued. A result is applied only if it is
/// newer than the last applied one, so the most recently issued reload wins
/// even when an older one completes later.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshGeneration {
    /// Number of the most recently issued reload
    pub issued: u64,
    /// Number of the reload whose result `items` holds (0 before the first)
    pub applied: u64,
}

impl RefreshGeneration {
    /// Numbers a new reload
    pub const fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Whether a result for `generation` may replace the current items
    #[must_use]
    pub const fn is_current(&self, generation: u64) -> bool {
        generation > self.applied
    }
}

/// State of the to-do list view
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoState {
    /// Items in store enumeration order, replaced wholesale by each reload
    pub items: Vec<TodoItem>,
    /// Entry form values
    pub draft: Draft,
    /// Edit dialog
    pub edit: EditDialog,
    /// Most recent failure, cleared by the next success
    pub last_error: Option<String>,
    /// Reload numbering
    pub refresh: RefreshGeneration,
}

impl TodoState {
    /// Creates a new empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of items
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Returns an item by id
    #[must_use]
    pub fn get(&self, id: &TodoId) -> Option<&TodoItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Checks if an item is present
    #[must_use]
    pub fn exists(&self, id: &TodoId) -> bool {
        self.get(id).is_some()
    }

    /// List rows in display form
    #[must_use]
    pub fn rows(&self) -> Vec<TodoRow> {
        self.items.iter().map(TodoItem::row).collect()
    }
}

/// Actions representing commands and events of the view
///
/// Commands come from the presentation layer. Events are produced by effects
/// and carry the `RequestId` of the command that caused them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TodoAction {
    // ========== Commands ==========
    /// Command: Reload the whole collection
    Refresh {
        /// Correlation id
        request_id: RequestId,
    },

    /// Command: Replace the entry form
    SetDraft {
        /// New form values
        draft: Draft,
    },

    /// Command: Edit the entry form title
    SetDraftTitle {
        /// Title input
        title: String,
    },

    /// Command: Edit the entry form details
    SetDraftDetails {
        /// Details input
        details: String,
    },

    /// Command: Edit the entry form due date
    SetDraftDueDate {
        /// Due date input
        due_date: String,
    },

    /// Command: Submit the entry form
    Create {
        /// Correlation id
        request_id: RequestId,
    },

    /// Command: Open the edit dialog on an item
    BeginEdit {
        /// Item to edit
        item: TodoItem,
    },

    /// Command: Edit the dialog title
    SetEditTitle {
        /// Title input
        title: String,
    },

    /// Command: Edit the dialog details
    SetEditDetails {
        /// Details input
        details: String,
    },

    /// Command: Edit the dialog due date
    SetEditDueDate {
        /// Due date input
        due_date: String,
    },

    /// Command: Save the edit dialog
    SaveEdit {
        /// Correlation id
        request_id: RequestId,
    },

    /// Command: Close the edit dialog without saving
    CancelEdit,

    /// Command: Delete an item
    Delete {
        /// Correlation id
        request_id: RequestId,
        /// Item to delete
        id: TodoId,
    },

    // ========== Events ==========
    /// Event: A reload finished
    ItemsLoaded {
        /// Correlation id
        request_id: RequestId,
        /// Reload number
        generation: u64,
        /// The whole collection
        items: Vec<TodoItem>,
    },

    /// Event: A reload failed
    RefreshFailed {
        /// Correlation id
        request_id: RequestId,
        /// Reload number
        generation: u64,
        /// Cause
        error: TodoStoreError,
    },

    /// Event: An item was created
    Created {
        /// Correlation id
        request_id: RequestId,
        /// Store-assigned id
        id: TodoId,
    },

    /// Event: Creating an item failed
    CreateFailed {
        /// Correlation id
        request_id: RequestId,
        /// Cause
        error: TodoStoreError,
    },

    /// Event: An item was updated
    Updated {
        /// Correlation id
        request_id: RequestId,
        /// Updated item
        id: TodoId,
    },

    /// Event: Updating an item failed
    UpdateFailed {
        /// Correlation id
        request_id: RequestId,
        /// Target item
        id: TodoId,
        /// Cause
        error: TodoStoreError,
    },

    /// Event: An item was deleted
    Deleted {
        /// Correlation id
        request_id: RequestId,
        /// Deleted item
        id: TodoId,
    },

    /// Event: Deleting an item failed
    DeleteFailed {
        /// Correlation id
        request_id: RequestId,
        /// Target item
        id: TodoId,
        /// Cause
        error: TodoStoreError,
    },

    /// Event: Form values were rejected before reaching the store
    ValidationFailed {
        /// Correlation id
        request_id: RequestId,
        /// First offending field
        error: ValidationError,
    },

    /// Event: Save requested with no dialog open
    EditNotOpen {
        /// Correlation id
        request_id: RequestId,
    },
}

impl TodoAction {
    /// Correlation id of a request-carrying action
    #[must_use]
    pub const fn request_id(&self) -> Option<RequestId> {
        match self {
            Self::Refresh { request_id }
            | Self::Create { request_id }
            | Self::SaveEdit { request_id }
            | Self::Delete { request_id, .. }
            | Self::ItemsLoaded { request_id, .. }
            | Self::RefreshFailed { request_id, .. }
            | Self::Created { request_id, .. }
            | Self::CreateFailed { request_id, .. }
            | Self::Updated { request_id, .. }
            | Self::UpdateFailed { request_id, .. }
            | Self::Deleted { request_id, .. }
            | Self::DeleteFailed { request_id, .. }
            | Self::ValidationFailed { request_id, .. }
            | Self::EditNotOpen { request_id } => Some(*request_id),
            Self::SetDraft { .. }
            | Self::SetDraftTitle { .. }
            | Self::SetDraftDetails { .. }
            | Self::SetDraftDueDate { .. }
            | Self::BeginEdit { .. }
            | Self::SetEditTitle { .. }
            | Self::SetEditDetails { .. }
            | Self::SetEditDueDate { .. }
            | Self::CancelEdit => None,
        }
    }

    /// Whether this is the last action a request leads to.
    ///
    /// A successful write is followed by a reload, so `Created`, `Updated`
    /// and `Deleted` are not terminal; the reload outcome is.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::ItemsLoaded { .. }
                | Self::RefreshFailed { .. }
                | Self::CreateFailed { .. }
                | Self::UpdateFailed { .. }
                | Self::DeleteFailed { .. }
                | Self::ValidationFailed { .. }
                | Self::EditNotOpen { .. }
        )
    }

    /// Whether this action is a command
    #[must_use]
    pub const fn is_command(&self) -> bool {
        !self.is_event()
    }

    /// Whether this action is an event
    #[must_use]
    pub const fn is_event(&self) -> bool {
        matches!(
            self,
            Self::ItemsLoaded { .. }
                | Self::RefreshFailed { .. }
                | Self::Created { .. }
                | Self::CreateFailed { .. }
                | Self::Updated { .. }
                | Self::UpdateFailed { .. }
                | Self::Deleted { .. }
                | Self::DeleteFailed { .. }
                | Self::ValidationFailed { .. }
                | Self::EditNotOpen { .. }
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use todo_client_core::todo::DueDate;

    fn item() -> TodoItem {
        TodoItem {
            id: TodoId::new("a1"),
            title: "Buy milk".to_string(),
            details: "2%, 1 gallon".to_string(),
            due_date: "2024-06-01T10:00".parse::<DueDate>().unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn request_id_display() {
        let id = RequestId::new();
        assert_eq!(id.to_string().len(), 36);
        assert_ne!(id, RequestId::new());
    }

    #[test]
    fn editing_item_copies_fields() {
        let item = item();
        let editing = EditingItem::from_item(&item);

        assert_eq!(editing.id, item.id);
        assert_eq!(editing.created_at, item.created_at);
        assert_eq!(editing.form, Draft::new("Buy milk", "2%, 1 gallon", "2024-06-01T10:00"));
    }

    #[test]
    fn dialog_starts_closed() {
        let state = TodoState::new();
        assert!(!state.edit.is_open());
        assert!(state.edit.editing().is_none());
    }

    #[test]
    fn generation_accepts_only_newer_results() {
        let mut refresh = RefreshGeneration::default();
        let first = refresh.issue();
        let second = refresh.issue();

        refresh.applied = second;
        assert!(!refresh.is_current(first));
        assert!(!refresh.is_current(second));
        let third = refresh.issue();
        assert!(refresh.is_current(third));
    }

    #[test]
    fn state_lookup_and_rows() {
        let mut state = TodoState::new();
        state.items.push(item());

        assert_eq!(state.count(), 1);
        assert!(state.exists(&TodoId::new("a1")));
        assert!(!state.exists(&TodoId::new("zz")));
        assert_eq!(state.rows()[0].due, "Jun 1, 2024, 10:00:00 AM");
    }

    #[test]
    fn writes_are_not_terminal() {
        let request_id = RequestId::new();
        let created = TodoAction::Created {
            request_id,
            id: TodoId::new("a1"),
        };
        let loaded = TodoAction::ItemsLoaded {
            request_id,
            generation: 1,
            items: Vec::new(),
        };

        assert!(created.is_event());
        assert!(!created.is_terminal());
        assert!(loaded.is_terminal());
        assert_eq!(created.request_id(), Some(request_id));
    }

    #[test]
    fn commands_are_not_events() {
        assert!(TodoAction::CancelEdit.is_command());
        assert_eq!(TodoAction::CancelEdit.request_id(), None);
        assert!(
            TodoAction::Create {
                request_id: RequestId::new()
            }
            .is_command()
        );
    }
}
