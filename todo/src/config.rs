//! Configuration management for the todo application.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::client::DEFAULT_REQUEST_TIMEOUT;
use std::env;
use std::time::Duration;
use todo_client_firestore::{FirestoreConfig, FirestoreError};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Firestore backend; `None` selects the in-memory store
    pub firestore: Option<FirestoreConfig>,
    /// Client configuration
    pub client: ClientConfig,
}

/// View model configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Seconds to wait for the outcome of an operation
    pub request_timeout: u64,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl ClientConfig {
    /// Outcome timeout as a `Duration`
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A missing `FIRESTORE_PROJECT_ID` is not an error: the application then
    /// runs against the in-memory store.
    ///
    /// # Errors
    ///
    /// Returns a [`FirestoreError`] for a Firestore setting that is present but
    /// invalid.
    pub fn from_env() -> Result<Self, FirestoreError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, FirestoreError> {
        let firestore = match FirestoreConfig::from_lookup(&lookup) {
            Ok(config) => Some(config),
            Err(FirestoreError::MissingProjectId) => None,
            Err(error) => return Err(error),
        };

        Ok(Self {
            firestore,
            client: ClientConfig {
                request_timeout: lookup("TODO_REQUEST_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT.as_secs()),
                log_level: lookup("TODO_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            },
        })
    }
}
