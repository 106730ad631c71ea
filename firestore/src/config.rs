//! Connection settings for the Firestore REST API.
//!
//! Loaded from environment variables with sensible defaults.

use crate::error::FirestoreError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default REST endpoint
pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Default database id
pub const DEFAULT_DATABASE: &str = "(default)";

/// Default collection holding the todo documents
pub const DEFAULT_COLLECTION: &str = "todos";

/// Default number of documents requested per list page
pub const DEFAULT_PAGE_SIZE: u32 = 300;

/// Default HTTP request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Firestore connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirestoreConfig {
    /// Google Cloud project id
    pub project_id: String,
    /// Database id (`(default)` unless a named database is used)
    pub database: String,
    /// Collection holding the todo documents
    pub collection: String,
    /// REST endpoint including the API version
    pub base_url: String,
    /// Web API key, sent as the `key` query parameter
    pub api_key: Option<String>,
    /// OAuth bearer token, sent in the `Authorization` header
    pub bearer_token: Option<String>,
    /// Documents requested per list page
    pub page_size: u32,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl FirestoreConfig {
    /// Configuration for a project with every other setting at its default
    #[must_use]
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            bearer_token: None,
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Point the client at another endpoint (emulator, mock server)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use another collection
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Set the web API key
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the bearer token
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set the list page size
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`FirestoreError::MissingProjectId`] if `FIRESTORE_PROJECT_ID` is
    /// not set, or [`FirestoreError::InvalidSetting`] for a numeric setting that
    /// does not parse.
    pub fn from_env() -> Result<Self, FirestoreError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`FirestoreConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, FirestoreError> {
        let project_id = lookup("FIRESTORE_PROJECT_ID")
            .filter(|id| !id.trim().is_empty())
            .ok_or(FirestoreError::MissingProjectId)?;

        let emulator_host = lookup("FIRESTORE_EMULATOR_HOST").filter(|host| !host.is_empty());

        let base_url = match (lookup("FIRESTORE_BASE_URL"), &emulator_host) {
            (Some(url), _) => url,
            (None, Some(host)) => format!("http://{host}/v1"),
            (None, None) => DEFAULT_BASE_URL.to_string(),
        };

        // The emulator accepts any request carrying this token
        let bearer_token = lookup("FIRESTORE_BEARER_TOKEN")
            .or_else(|| emulator_host.as_ref().map(|_| "owner".to_string()));

        Ok(Self {
            project_id,
            database: lookup("FIRESTORE_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            collection: lookup("FIRESTORE_COLLECTION")
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: lookup("FIRESTORE_API_KEY"),
            bearer_token,
            page_size: parse_setting(&lookup, "FIRESTORE_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            timeout_secs: parse_setting(&lookup, "FIRESTORE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
        })
    }

    /// HTTP request timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `.../projects/{project}/databases/{database}/documents/{collection}`
    #[must_use]
    pub fn collection_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents/{}",
            self.base_url, self.project_id, self.database, self.collection
        )
    }

    /// Collection URL, parsed and ready for document ids to be appended.
    ///
    /// # Errors
    ///
    /// Returns [`FirestoreError::InvalidSetting`] if the base URL is not an
    /// absolute hierarchical URL.
    pub fn collection_endpoint(&self) -> Result<Url, FirestoreError> {
        let invalid = || FirestoreError::InvalidSetting {
            name: "FIRESTORE_BASE_URL",
            value: self.base_url.clone(),
        };

        let url = Url::parse(&self.collection_url()).map_err(|_| invalid())?;
        if url.cannot_be_a_base() {
            return Err(invalid());
        }
        Ok(url)
    }
}

fn parse_setting<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, FirestoreError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| FirestoreError::InvalidSetting { name, value }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = FirestoreConfig::from_lookup(lookup_from(&[("FIRESTORE_PROJECT_ID", "demo")])).unwrap();

        assert_eq!(config, FirestoreConfig::new("demo"));
        assert_eq!(
            config.collection_url(),
            "https://firestore.googleapis.com/v1/projects/demo/databases/(default)/documents/todos"
        );
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn missing_project_id_is_an_error() {
        let result = FirestoreConfig::from_lookup(lookup_from(&[("FIRESTORE_API_KEY", "k")]));
        assert!(matches!(result, Err(FirestoreError::MissingProjectId)));
    }

    #[test]
    fn emulator_host_sets_url_and_token() {
        let config = FirestoreConfig::from_lookup(lookup_from(&[
            ("FIRESTORE_PROJECT_ID", "demo"),
            ("FIRESTORE_EMULATOR_HOST", "localhost:8080"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.bearer_token.as_deref(), Some("owner"));
    }

    #[test]
    fn explicit_settings_win() {
        let config = FirestoreConfig::from_lookup(lookup_from(&[
            ("FIRESTORE_PROJECT_ID", "demo"),
            ("FIRESTORE_EMULATOR_HOST", "localhost:8080"),
            ("FIRESTORE_BASE_URL", "http://mock:9000/v1/"),
            ("FIRESTORE_BEARER_TOKEN", "secret"),
            ("FIRESTORE_COLLECTION", "chores"),
            ("FIRESTORE_PAGE_SIZE", "25"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://mock:9000/v1");
        assert_eq!(config.bearer_token.as_deref(), Some("secret"));
        assert_eq!(config.page_size, 25);
        assert_eq!(
            config.collection_endpoint().unwrap().as_str(),
            "http://mock:9000/v1/projects/demo/databases/(default)/documents/chores"
        );
    }

    #[test]
    fn unusable_base_url_is_rejected() {
        let config = FirestoreConfig::new("demo").with_base_url("not a url");

        assert!(matches!(
            config.collection_endpoint(),
            Err(FirestoreError::InvalidSetting { name: "FIRESTORE_BASE_URL", .. })
        ));
    }

    #[test]
    fn unparsable_number_is_rejected() {
        let result = FirestoreConfig::from_lookup(lookup_from(&[
            ("FIRESTORE_PROJECT_ID", "demo"),
            ("FIRESTORE_PAGE_SIZE", "lots"),
        ]));

        assert!(matches!(
            result,
            Err(FirestoreError::InvalidSetting { name: "FIRESTORE_PAGE_SIZE", .. })
        ));
    }
}
