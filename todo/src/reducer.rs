//! Reducer logic for the to-do list view.
//!
//! Commands either change local form state or describe exactly one store
//! call as an effect. Every successful write is followed by a full reload
//! carrying the same request id; nothing is merged into `items` locally.

use crate::types::{EditDialog, EditingItem, RequestId, TodoAction, TodoState};
use std::sync::Arc;
use todo_client_core::{
    SmallVec,
    effect::Effect,
    environment::Clock,
    reducer::Reducer,
    smallvec,
    todo::{Draft, NewTodo, TodoId, ValidationError},
    todo_store::TodoStore,
};

/// Environment dependencies for the to-do reducer
#[derive(Clone)]
pub struct TodoEnvironment {
    /// Clock for creation timestamps
    pub clock: Arc<dyn Clock>,
    /// Remote document store
    pub store: Arc<dyn TodoStore>,
}

impl TodoEnvironment {
    /// Creates a new `TodoEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, store: Arc<dyn TodoStore>) -> Self {
        Self { clock, store }
    }
}

/// Reducer for the to-do list view
#[derive(Clone, Debug)]
pub struct TodoReducer;

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Numbers a reload and describes the fetch
    fn reload(
        state: &mut TodoState,
        env: &TodoEnvironment,
        request_id: RequestId,
    ) -> Effect<TodoAction> {
        let generation = state.refresh.issue();
        let store = Arc::clone(&env.store);

        tracing::debug!(%request_id, generation, "Reloading items");

        Effect::future(async move {
            Some(match store.list_all().await {
                Ok(items) => TodoAction::ItemsLoaded {
                    request_id,
                    generation,
                    items,
                },
                Err(error) => TodoAction::RefreshFailed {
                    request_id,
                    generation,
                    error,
                },
            })
        })
    }

    /// Reports a rejected form through the regular event path
    fn reject(request_id: RequestId, error: ValidationError) -> Effect<TodoAction> {
        Effect::future(async move { Some(TodoAction::ValidationFailed { request_id, error }) })
    }

    fn create(
        state: &TodoState,
        env: &TodoEnvironment,
        request_id: RequestId,
    ) -> Effect<TodoAction> {
        let fields = match state.draft.validate() {
            Ok(fields) => fields,
            Err(error) => return Self::reject(request_id, error),
        };

        let todo = NewTodo::new(fields, env.clock.now());
        let store = Arc::clone(&env.store);

        Effect::future(async move {
            Some(match store.create(todo).await {
                Ok(id) => TodoAction::Created { request_id, id },
                Err(error) => TodoAction::CreateFailed { request_id, error },
            })
        })
    }

    fn save_edit(
        state: &TodoState,
        env: &TodoEnvironment,
        request_id: RequestId,
    ) -> Effect<TodoAction> {
        let Some(editing) = state.edit.editing() else {
            return Effect::future(async move { Some(TodoAction::EditNotOpen { request_id }) });
        };

        let fields = match editing.form.validate() {
            Ok(fields) => fields,
            Err(error) => return Self::reject(request_id, error),
        };

        let id = editing.id.clone();
        let store = Arc::clone(&env.store);

        Effect::future(async move {
            Some(match store.update(&id, fields).await {
                Ok(()) => TodoAction::Updated { request_id, id },
                Err(error) => TodoAction::UpdateFailed {
                    request_id,
                    id,
                    error,
                },
            })
        })
    }

    fn delete(env: &TodoEnvironment, request_id: RequestId, id: TodoId) -> Effect<TodoAction> {
        let store = Arc::clone(&env.store);

        Effect::future(async move {
            Some(match store.delete(&id).await {
                Ok(()) => TodoAction::Deleted { request_id, id },
                Err(error) => TodoAction::DeleteFailed {
                    request_id,
                    id,
                    error,
                },
            })
        })
    }

    /// Applies an edit to the open dialog; ignored while closed
    fn edit_form(state: &mut TodoState, apply: impl FnOnce(&mut EditingItem)) {
        match &mut state.edit {
            EditDialog::Open(editing) => apply(editing),
            EditDialog::Closed => tracing::debug!("Ignoring edit input: dialog is closed"),
        }
    }
}

impl Default for TodoReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for TodoReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action, each short
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            TodoAction::Refresh { request_id } => {
                smallvec![Self::reload(state, env, request_id)]
            },

            TodoAction::SetDraft { draft } => {
                state.draft = draft;
                SmallVec::new()
            },
            TodoAction::SetDraftTitle { title } => {
                state.draft.title = title;
                SmallVec::new()
            },
            TodoAction::SetDraftDetails { details } => {
                state.draft.details = details;
                SmallVec::new()
            },
            TodoAction::SetDraftDueDate { due_date } => {
                state.draft.due_date = due_date;
                SmallVec::new()
            },

            TodoAction::Create { request_id } => {
                smallvec![Self::create(state, env, request_id)]
            },

            TodoAction::BeginEdit { item } => {
                state.edit = EditDialog::Open(EditingItem::from_item(&item));
                SmallVec::new()
            },
            TodoAction::SetEditTitle { title } => {
                Self::edit_form(state, |editing| editing.form.title = title);
                SmallVec::new()
            },
            TodoAction::SetEditDetails { details } => {
                Self::edit_form(state, |editing| editing.form.details = details);
                SmallVec::new()
            },
            TodoAction::SetEditDueDate { due_date } => {
                Self::edit_form(state, |editing| editing.form.due_date = due_date);
                SmallVec::new()
            },

            TodoAction::SaveEdit { request_id } => {
                smallvec![Self::save_edit(state, env, request_id)]
            },

            TodoAction::CancelEdit => {
                state.edit = EditDialog::Closed;
                SmallVec::new()
            },

            TodoAction::Delete { request_id, id } => {
                smallvec![Self::delete(env, request_id, id)]
            },

            // ========== Events ==========
            TodoAction::ItemsLoaded {
                request_id,
                generation,
                items,
            } => {
                if state.refresh.is_current(generation) {
                    tracing::debug!(%request_id, generation, count = items.len(), "Items loaded");
                    state.items = items;
                    state.refresh.applied = generation;
                    state.last_error = None;
                } else {
                    tracing::debug!(
                        %request_id,
                        generation,
                        applied = state.refresh.applied,
                        "Discarding stale reload"
                    );
                }
                SmallVec::new()
            },

            TodoAction::RefreshFailed {
                request_id,
                generation,
                error,
            } => {
                if state.refresh.is_current(generation) {
                    tracing::error!(%request_id, generation, %error, "Reload failed, keeping previous items");
                    state.last_error = Some(error.to_string());
                } else {
                    tracing::debug!(
                        %request_id,
                        generation,
                        applied = state.refresh.applied,
                        %error,
                        "Ignoring failure of superseded reload"
                    );
                }
                SmallVec::new()
            },

            TodoAction::Created { request_id, id } => {
                tracing::info!(%request_id, %id, "Item created");
                state.draft = Draft::default();
                state.last_error = None;
                smallvec![Self::reload(state, env, request_id)]
            },

            TodoAction::CreateFailed { request_id, error } => {
                tracing::error!(%request_id, %error, "Create failed, keeping draft");
                state.last_error = Some(error.to_string());
                SmallVec::new()
            },

            TodoAction::Updated { request_id, id } => {
                tracing::info!(%request_id, %id, "Item updated");
                state.edit = EditDialog::Closed;
                state.last_error = None;
                smallvec![Self::reload(state, env, request_id)]
            },

            TodoAction::UpdateFailed {
                request_id,
                id,
                error,
            } => {
                tracing::error!(%request_id, %id, %error, "Update failed, keeping dialog open");
                state.last_error = Some(error.to_string());
                SmallVec::new()
            },

            TodoAction::Deleted { request_id, id } => {
                tracing::info!(%request_id, %id, "Item deleted");
                state.last_error = None;
                smallvec![Self::reload(state, env, request_id)]
            },

            TodoAction::DeleteFailed {
                request_id,
                id,
                error,
            } => {
                tracing::error!(%request_id, %id, %error, "Delete failed");
                state.last_error = Some(error.to_string());
                SmallVec::new()
            },

            TodoAction::ValidationFailed { request_id, error } => {
                tracing::warn!(%request_id, %error, "Form rejected");
                state.last_error = Some(error.to_string());
                SmallVec::new()
            },

            TodoAction::EditNotOpen { request_id } => {
                tracing::warn!(%request_id, "Save requested with no item being edited");
                state.last_error = Some("no item is being edited".to_string());
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use todo_client_core::todo::{Field, TodoItem};
    use todo_client_core::todo_store::TodoStoreError;
    use todo_client_testing::{
        FixedClock, InMemoryTodoStore, ReducerTest, assertions, collect_actions, test_clock,
    };

    fn create_test_env(store: &InMemoryTodoStore) -> TodoEnvironment {
        TodoEnvironment::new(Arc::new(test_clock()), Arc::new(store.clone()))
    }

    fn stored_item(store: &InMemoryTodoStore) -> TodoItem {
        store.items().into_iter().next().unwrap()
    }

    fn store_with_one_item() -> InMemoryTodoStore {
        let item = TodoItem::from_new(
            TodoId::new("todo-0"),
            NewTodo::new(
                Draft::new("Buy milk", "2%, 1 gallon", "2024-06-01T10:00")
                    .validate()
                    .unwrap(),
                test_clock().now(),
            ),
        );
        InMemoryTodoStore::with_items([item])
    }

    #[test]
    fn test_draft_inputs_update_form() {
        let store = InMemoryTodoStore::new();

        let _ = ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env(&store))
            .given_state(TodoState::new())
            .when_action(TodoAction::SetDraftTitle {
                title: "Buy milk".to_string(),
            })
            .then_state(|state| assert_eq!(state.draft.title, "Buy milk"))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn test_refresh_loads_items() {
        let store = store_with_one_item();
        let request_id = RequestId::new();

        let effects = ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env(&store))
            .given_state(TodoState::new())
            .when_action(TodoAction::Refresh { request_id })
            .then_state(|state| {
                assert_eq!(state.refresh.issued, 1);
                assert!(state.items.is_empty());
            })
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .run();

        let actions = collect_actions(effects).await;
        assert_eq!(
            actions,
            vec![TodoAction::ItemsLoaded {
                request_id,
                generation: 1,
                items: store.items(),
            }]
        );
    }

    #[tokio::test]
    async fn test_create_submits_draft_with_clock_time() {
        let store = InMemoryTodoStore::new();
        let request_id = RequestId::new();
        let state = TodoState {
            draft: Draft::new("Buy milk", "2%, 1 gallon", "2024-06-01T10:00"),
            ..TodoState::new()
        };

        let effects = ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env(&store))
            .given_state(state)
            .when_action(TodoAction::Create { request_id })
            .then_state(|state| assert_eq!(state.draft.title, "Buy milk"))
            .then_effects(assertions::assert_has_future_effect)
            .run();

        let actions = collect_actions(effects).await;
        let item = stored_item(&store);
        assert_eq!(
            actions,
            vec![TodoAction::Created {
                request_id,
                id: item.id.clone(),
            }]
        );
        assert_eq!(item.created_at, test_clock().now());
    }

    #[tokio::test]
    async fn test_create_with_blank_field_never_reaches_store() {
        let store = InMemoryTodoStore::new();
        let request_id = RequestId::new();
        let state = TodoState {
            draft: Draft::new("Buy milk", "   ", "2024-06-01T10:00"),
            ..TodoState::new()
        };

        let effects = ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env(&store))
            .given_state(state)
            .when_action(TodoAction::Create { request_id })
            .run();

        assert_eq!(
            collect_actions(effects).await,
            vec![TodoAction::ValidationFailed {
                request_id,
                error: ValidationError::EmptyField(Field::Details),
            }]
        );
        assert_eq!(store.calls().create, 0);
    }

    #[test]
    fn test_created_clears_draft_and_reloads() {
        let store = InMemoryTodoStore::new();
        let state = TodoState {
            draft: Draft::new("Buy milk", "2%, 1 gallon", "2024-06-01T10:00"),
            last_error: Some("earlier failure".to_string()),
            ..TodoState::new()
        };

        let _ = ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env(&store))
            .given_state(state)
            .when_action(TodoAction::Created {
                request_id: RequestId::new(),
                id: TodoId::new("todo-1"),
            })
            .then_state(|state| {
                assert!(state.draft.is_empty());
                assert!(state.last_error.is_none());
                assert_eq!(state.refresh.issued, 1);
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn test_create_failed_keeps_draft() {
        let store = InMemoryTodoStore::new();
        let draft = Draft::new("Buy milk", "2%, 1 gallon", "2024-06-01T10:00");
        let state = TodoState {
            draft: draft.clone(),
            ..TodoState::new()
        };

        let _ = ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env(&store))
            .given_state(state)
            .when_action(TodoAction::CreateFailed {
                request_id: RequestId::new(),
                error: TodoStoreError::Unavailable("offline".to_string()),
            })
            .then_state(move |state| {
                assert_eq!(state.draft, draft);
                assert_eq!(
                    state.last_error.as_deref(),
                    Some("store unavailable: offline")
                );
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_begin_edit_and_cancel() {
        let store = store_with_one_item();
        let item = stored_item(&store);
        let env = create_test_env(&store);

        let mut state = TodoState::new();
        let reducer = TodoReducer::new();
        let effects = reducer.reduce(&mut state, TodoAction::BeginEdit { item: item.clone() }, &env);
        assertions::assert_no_effects(&effects);
        assert_eq!(state.edit, EditDialog::Open(EditingItem::from_item(&item)));

        let _ = ReducerTest::new(reducer)
            .with_env(env)
            .given_state(state)
            .when_action(TodoAction::CancelEdit)
            .then_state(|state| assert_eq!(state.edit, EditDialog::Closed))
            .then_effects(assertions::assert_no_effects)
            .run();

        assert_eq!(store.calls().writes(), 0);
    }

    #[test]
    fn test_edit_input_ignored_while_closed() {
        let store = InMemoryTodoStore::new();

        let _ = ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env(&store))
            .given_state(TodoState::new())
            .when_action(TodoAction::SetEditTitle {
                title: "orphan".to_string(),
            })
            .then_state(|state| assert_eq!(*state, TodoState::new()))
            .run();
    }

    #[tokio::test]
    async fn test_save_edit_sends_fields_only() {
        let store = store_with_one_item();
        let item = stored_item(&store);
        let request_id = RequestId::new();

        let mut editing = EditingItem::from_item(&item);
        editing.form.title = "Buy oat milk".to_string();
        let state = TodoState {
            edit: EditDialog::Open(editing),
            ..TodoState::new()
        };

        let effects = ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env(&store))
            .given_state(state)
            .when_action(TodoAction::SaveEdit { request_id })
            .then_state(|state| assert!(state.edit.is_open()))
            .run();

        assert_eq!(
            collect_actions(effects).await,
            vec![TodoAction::Updated {
                request_id,
                id: item.id.clone(),
            }]
        );
        let updated = stored_item(&store);
        assert_eq!(updated.title, "Buy oat milk");
        assert_eq!(updated.created_at, item.created_at);
    }

    #[tokio::test]
    async fn test_save_edit_without_dialog() {
        let store = InMemoryTodoStore::new();
        let request_id = RequestId::new();

        let effects = ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env(&store))
            .given_state(TodoState::new())
            .when_action(TodoAction::SaveEdit { request_id })
            .run();

        assert_eq!(
            collect_actions(effects).await,
            vec![TodoAction::EditNotOpen { request_id }]
        );
        assert_eq!(store.calls().update, 0);
    }

    #[test]
    fn test_update_failed_keeps_dialog_values() {
        let store = store_with_one_item();
        let mut editing = EditingItem::from_item(&stored_item(&store));
        editing.form.title = "unsaved".to_string();
        let dialog = EditDialog::Open(editing);
        let state = TodoState {
            edit: dialog.clone(),
            ..TodoState::new()
        };

        let _ = ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env(&store))
            .given_state(state)
            .when_action(TodoAction::UpdateFailed {
                request_id: RequestId::new(),
                id: TodoId::new("todo-0"),
                error: TodoStoreError::NotFound(TodoId::new("todo-0")),
            })
            .then_state(move |state| {
                assert_eq!(state.edit, dialog);
                assert!(state.last_error.is_some());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_updated_closes_dialog_and_reloads() {
        let store = store_with_one_item();
        let state = TodoState {
            edit: EditDialog::Open(EditingItem::from_item(&stored_item(&store))),
            ..TodoState::new()
        };

        let _ = ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env(&store))
            .given_state(state)
            .when_action(TodoAction::Updated {
                request_id: RequestId::new(),
                id: TodoId::new("todo-0"),
            })
            .then_state(|state| assert_eq!(state.edit, EditDialog::Closed))
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[tokio::test]
    async fn test_delete_missing_item_fails() {
        let store = InMemoryTodoStore::new();
        let request_id = RequestId::new();
        let id = TodoId::new("gone");

        let effects = ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env(&store))
            .given_state(TodoState::new())
            .when_action(TodoAction::Delete {
                request_id,
                id: id.clone(),
            })
            .run();

        assert_eq!(
            collect_actions(effects).await,
            vec![TodoAction::DeleteFailed {
                request_id,
                id: id.clone(),
                error: TodoStoreError::NotFound(id),
            }]
        );
    }

    #[test]
    fn test_stale_reload_is_discarded() {
        let store = store_with_one_item();
        let newer = vec![stored_item(&store)];
        let mut state = TodoState::new();
        state.refresh.issued = 2;
        state.refresh.applied = 2;
        state.items.clone_from(&newer);

        let _ = ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env(&store))
            .given_state(state)
            .when_action(TodoAction::ItemsLoaded {
                request_id: RequestId::new(),
                generation: 1,
                items: Vec::new(),
            })
            .then_state(move |state| {
                assert_eq!(state.items, newer);
                assert_eq!(state.refresh.applied, 2);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_refresh_failure_keeps_items() {
        let store = store_with_one_item();
        let items = store.items();
        let state = TodoState {
            items: items.clone(),
            ..TodoState::new()
        };

        let _ = ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env(&store))
            .given_state(state)
            .when_action(TodoAction::RefreshFailed {
                request_id: RequestId::new(),
                generation: 1,
                error: TodoStoreError::Unavailable("offline".to_string()),
            })
            .then_state(move |state| {
                assert_eq!(state.items, items);
                assert!(state.last_error.is_some());
            })
            .run();
    }

    #[test]
    fn test_successful_reload_clears_error() {
        let store = store_with_one_item();
        let items = store.items();
        let mut state = TodoState {
            last_error: Some("store unavailable: offline".to_string()),
            ..TodoState::new()
        };
        state.refresh.issued = 2;
        state.refresh.applied = 0;

        let _ = ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env(&store))
            .given_state(state)
            .when_action(TodoAction::ItemsLoaded {
                request_id: RequestId::new(),
                generation: 2,
                items: items.clone(),
            })
            .then_state(move |state| {
                assert_eq!(state.items, items);
                assert!(state.last_error.is_none());
            })
            .run();
    }

    #[test]
    fn test_superseded_reload_failure_is_ignored() {
        let store = store_with_one_item();
        let items = store.items();
        let mut state = TodoState {
            items: items.clone(),
            ..TodoState::new()
        };
        state.refresh.issued = 2;
        state.refresh.applied = 2;

        let _ = ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env(&store))
            .given_state(state)
            .when_action(TodoAction::RefreshFailed {
                request_id: RequestId::new(),
                generation: 1,
                error: TodoStoreError::Unavailable("offline".to_string()),
            })
            .then_state(move |state| {
                assert_eq!(state.items, items);
                assert!(state.last_error.is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_fixed_clock_is_injected() {
        let at = test_clock().now() + chrono::Duration::days(1);
        let env = TodoEnvironment::new(Arc::new(FixedClock::new(at)), Arc::new(InMemoryTodoStore::new()));
        assert_eq!(env.clock.now(), at);
    }
}
