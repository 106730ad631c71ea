//! Error types for setting up the Firestore client

use thiserror::Error;

/// Errors raised while configuring the Firestore client.
///
/// Request failures are reported as
/// [`TodoStoreError`](todo_client_core::todo_store::TodoStoreError) instead.
#[derive(Debug, Error)]
pub enum FirestoreError {
    /// Missing `FIRESTORE_PROJECT_ID` environment variable
    #[error("Missing FIRESTORE_PROJECT_ID environment variable")]
    MissingProjectId,

    /// A setting has a value that cannot be used
    #[error("Invalid value for {name}: {value:?}")]
    InvalidSetting {
        /// Variable name
        name: &'static str,
        /// Rejected value
        value: String,
    },

    /// HTTP client could not be built
    #[error("HTTP client setup failed: {0}")]
    Client(String),
}
