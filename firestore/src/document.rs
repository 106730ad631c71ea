//! Firestore document codec.
//!
//! Firestore wraps every field in a typed value object
//! (`{"stringValue": "..."}`). Todo fields are all written as string values;
//! reads also accept `timestampValue` so documents written by other clients
//! with a native timestamp still decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use todo_client_core::todo::{
    DueDate, NewTodo, TodoFields, TodoId, TodoItem, format_timestamp,
};
use todo_client_core::todo_store::TodoStoreError;

/// Field names as stored in Firestore
pub mod fields {
    /// Title field
    pub const TITLE: &str = "title";
    /// Details field
    pub const DETAILS: &str = "details";
    /// Due date field
    pub const DUE_DATE: &str = "dueDate";
    /// Creation timestamp field
    pub const CREATED_AT: &str = "createdAt";

    /// Fields sent by an update; `createdAt` is never among them
    pub const UPDATE_MASK: [&str; 3] = [TITLE, DETAILS, DUE_DATE];
}

/// A typed Firestore value; only the variants the todo schema uses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Value {
    /// `stringValue`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    /// `timestampValue` (RFC 3339)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_value: Option<String>,
}

impl Value {
    /// A string value
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            string_value: Some(value.into()),
            timestamp_value: None,
        }
    }

    fn as_text(&self) -> Option<&str> {
        self.string_value
            .as_deref()
            .or(self.timestamp_value.as_deref())
    }
}

/// Request body for create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentBody {
    /// Field values keyed by field name
    pub fields: BTreeMap<String, Value>,
}

impl DocumentBody {
    /// Body for a create: all four fields
    #[must_use]
    pub fn for_create(todo: &NewTodo) -> Self {
        let mut body = Self::for_update(&todo.fields);
        body.fields.insert(
            fields::CREATED_AT.to_string(),
            Value::string(format_timestamp(&todo.created_at)),
        );
        body
    }

    /// Body for an update: exactly the update mask fields
    #[must_use]
    pub fn for_update(todo: &TodoFields) -> Self {
        let fields = [
            (fields::TITLE, todo.title.clone()),
            (fields::DETAILS, todo.details.clone()),
            (fields::DUE_DATE, todo.due_date.to_string()),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), Value::string(value)))
        .collect();

        Self { fields }
    }
}

/// A document as returned by the REST API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name, ending in `/{collection}/{id}`
    pub name: String,
    /// Field values keyed by field name
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl Document {
    /// Document id: the last segment of the resource name
    ///
    /// # Errors
    ///
    /// Returns [`TodoStoreError::Malformed`] for an empty name.
    pub fn id(&self) -> Result<TodoId, TodoStoreError> {
        self.name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .map(TodoId::from)
            .ok_or_else(|| TodoStoreError::Malformed(format!("document name {:?}", self.name)))
    }

    /// Decode into a [`TodoItem`]
    ///
    /// # Errors
    ///
    /// Returns [`TodoStoreError::Malformed`] when a field is missing or does not
    /// parse.
    pub fn into_item(self) -> Result<TodoItem, TodoStoreError> {
        let id = self.id()?;

        let due_date = self
            .text(fields::DUE_DATE)?
            .parse::<DueDate>()
            .map_err(|e| TodoStoreError::Malformed(format!("{id}: {e}")))?;

        let created_at = DateTime::parse_from_rfc3339(self.text(fields::CREATED_AT)?)
            .map_err(|e| TodoStoreError::Malformed(format!("{id}: createdAt: {e}")))?
            .with_timezone(&Utc);

        Ok(TodoItem {
            title: self.text(fields::TITLE)?.to_string(),
            details: self.text(fields::DETAILS)?.to_string(),
            due_date,
            created_at,
            id,
        })
    }

    fn text(&self, field: &str) -> Result<&str, TodoStoreError> {
        self.fields
            .get(field)
            .and_then(Value::as_text)
            .ok_or_else(|| TodoStoreError::Malformed(format!("{}: missing {field}", self.name)))
    }
}

/// One page of `documents.list`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    /// Documents on this page (absent for an empty collection)
    #[serde(default)]
    pub documents: Vec<Document>,
    /// Token for the next page, absent on the last one
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Error envelope of a failed request
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorStatus,
}

/// Google API error status
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorStatus {
    /// HTTP status code
    #[serde(default)]
    pub code: u16,
    /// Human readable message
    #[serde(default)]
    pub message: String,
    /// Canonical status name, e.g. `NOT_FOUND`
    #[serde(default)]
    pub status: String,
}
