//! Firestore REST client implementing [`TodoStore`]

use crate::{
    config::FirestoreConfig,
    document::{Document, DocumentBody, ErrorResponse, ListResponse, fields::UPDATE_MASK},
    error::FirestoreError,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use std::fmt;
use todo_client_core::todo::{NewTodo, TodoFields, TodoId, TodoItem};
use todo_client_core::todo_store::{StoreFuture, TodoStore, TodoStoreError};
use tracing::{Instrument, debug, debug_span, warn};

/// Todo store backed by a Firestore collection
#[derive(Clone)]
pub struct FirestoreTodoStore {
    client: Client,
    config: FirestoreConfig,
    collection: Url,
}

impl fmt::Debug for FirestoreTodoStore {
    // Credentials stay out of logs
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirestoreTodoStore")
            .field("project_id", &self.config.project_id)
            .field("database", &self.config.database)
            .field("collection", &self.config.collection)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl FirestoreTodoStore {
    /// Create a store from environment configuration
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError::MissingProjectId` if `FIRESTORE_PROJECT_ID` is not set,
    /// or any other configuration error from [`FirestoreConfig::from_env`].
    pub fn from_env() -> Result<Self, FirestoreError> {
        Self::new(FirestoreConfig::from_env()?)
    }

    /// Create a store with explicit configuration
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError::InvalidSetting` for an unusable base URL and
    /// `FirestoreError::Client` if the HTTP client cannot be built.
    pub fn new(config: FirestoreConfig) -> Result<Self, FirestoreError> {
        let collection = config.collection_endpoint()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| FirestoreError::Client(e.to_string()))?;

        Ok(Self {
            client,
            config,
            collection,
        })
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &FirestoreConfig {
        &self.config
    }

    /// Document URL with the id as one percent-encoded path segment
    fn document_url(&self, id: &TodoId) -> Url {
        let mut url = self.collection.clone();
        // `new` only accepts URLs that can be a base
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(id.as_str());
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.config.api_key {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        };
        match &self.config.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, TodoStoreError> {
        self.authorize(request)
            .send()
            .await
            .map_err(|e| TodoStoreError::Unavailable(e.to_string()))
    }

    async fn fetch_page(&self, page_token: Option<&str>) -> Result<ListResponse, TodoStoreError> {
        let mut request = self
            .client
            .get(self.collection.clone())
            .query(&[("pageSize", self.config.page_size)]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = self.send(request).await?;
        if !response.status().is_success() {
            return Err(failure(response, None).await);
        }

        response
            .json::<ListResponse>()
            .await
            .map_err(|e| TodoStoreError::Malformed(e.to_string()))
    }
}

impl TodoStore for FirestoreTodoStore {
    fn list_all(&self) -> StoreFuture<'_, Vec<TodoItem>> {
        Box::pin(
            async move {
                let mut items = Vec::new();
                let mut page_token: Option<String> = None;
                let mut pages = 0_usize;

                loop {
                    let page = self.fetch_page(page_token.as_deref()).await?;
                    pages += 1;

                    for document in page.documents {
                        let name = document.name.clone();
                        match document.into_item() {
                            Ok(item) => items.push(item),
                            // One bad document must not hide the rest of the list
                            Err(error) => warn!(document = %name, %error, "Skipping undecodable document"),
                        }
                    }

                    match page.next_page_token.filter(|token| !token.is_empty()) {
                        Some(token) => page_token = Some(token),
                        None => break,
                    }
                }

                debug!(count = items.len(), pages, "Listed todo documents");
                Ok(items)
            }
            .instrument(debug_span!("firestore.list_all", collection = %self.config.collection)),
        )
    }

    fn create(&self, todo: NewTodo) -> StoreFuture<'_, TodoId> {
        Box::pin(
            async move {
                let request = self
                    .client
                    .post(self.collection.clone())
                    .json(&DocumentBody::for_create(&todo));

                let response = self.send(request).await?;
                if !response.status().is_success() {
                    return Err(failure(response, None).await);
                }

                let document = response
                    .json::<Document>()
                    .await
                    .map_err(|e| TodoStoreError::Malformed(e.to_string()))?;
                let id = document.id()?;

                debug!(id = %id, "Created todo document");
                Ok(id)
            }
            .instrument(debug_span!("firestore.create", collection = %self.config.collection)),
        )
    }

    fn update<'a>(&'a self, id: &'a TodoId, fields: TodoFields) -> StoreFuture<'a, ()> {
        Box::pin(
            async move {
                let mut query: Vec<(&str, &str)> = UPDATE_MASK
                    .iter()
                    .map(|field| ("updateMask.fieldPaths", *field))
                    .collect();
                query.push(("currentDocument.exists", "true"));

                let request = self
                    .client
                    .patch(self.document_url(id))
                    .query(&query)
                    .json(&DocumentBody::for_update(&fields));

                let response = self.send(request).await?;
                if !response.status().is_success() {
                    return Err(failure(response, Some(id)).await);
                }

                debug!("Updated todo document");
                Ok(())
            }
            .instrument(debug_span!("firestore.update", id = %id)),
        )
    }

    fn delete<'a>(&'a self, id: &'a TodoId) -> StoreFuture<'a, ()> {
        Box::pin(
            async move {
                let request = self
                    .client
                    .delete(self.document_url(id))
                    .query(&[("currentDocument.exists", "true")]);

                let response = self.send(request).await?;
                if !response.status().is_success() {
                    return Err(failure(response, Some(id)).await);
                }

                debug!("Deleted todo document");
                Ok(())
            }
            .instrument(debug_span!("firestore.delete", id = %id)),
        )
    }
}

/// Maps an error response onto the store taxonomy.
///
/// `target` is the document a 404 refers to; without one a 404 means the
/// collection path itself is wrong.
async fn failure(response: Response, target: Option<&TodoId>) -> TodoStoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or(body);

    match (status, target) {
        (StatusCode::NOT_FOUND, Some(id)) => TodoStoreError::NotFound(id.clone()),
        (
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY | StatusCode::GATEWAY_TIMEOUT,
            _,
        ) => TodoStoreError::Unavailable(format!("status {}: {message}", status.as_u16())),
        _ => TodoStoreError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_credentials() {
        let store = FirestoreTodoStore::new(
            FirestoreConfig::new("demo")
                .with_api_key("very-secret-key")
                .with_bearer_token("very-secret-token"),
        )
        .unwrap();

        let debug = format!("{store:?}");
        assert!(debug.contains("demo"));
        assert!(!debug.contains("very-secret"));
    }

    #[test]
    fn document_ids_stay_one_path_segment() {
        let store = FirestoreTodoStore::new(
            FirestoreConfig::new("demo").with_base_url("http://localhost:8080/v1"),
        )
        .unwrap();
        let collection = "http://localhost:8080/v1/projects/demo/databases/(default)/documents/todos";

        assert_eq!(
            store.document_url(&TodoId::new("abc")).as_str(),
            format!("{collection}/abc")
        );
        assert_eq!(
            store.document_url(&TodoId::new("x?y")).as_str(),
            format!("{collection}/x%3Fy")
        );
        assert_eq!(
            store.document_url(&TodoId::new("x#y")).as_str(),
            format!("{collection}/x%23y")
        );
        assert_eq!(
            store.document_url(&TodoId::new("x/y")).as_str(),
            format!("{collection}/x%2Fy")
        );
    }

    #[test]
    fn unusable_base_url_fails_construction() {
        let result = FirestoreTodoStore::new(FirestoreConfig::new("demo").with_base_url("nowhere"));

        assert!(matches!(result, Err(FirestoreError::InvalidSetting { .. })));
    }

    #[test]
    fn store_is_usable_as_trait_object() {
        let store: std::sync::Arc<dyn TodoStore> =
            std::sync::Arc::new(FirestoreTodoStore::new(FirestoreConfig::new("demo")).unwrap());
        drop(store);
    }
}
