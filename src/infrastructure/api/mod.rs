mod auth;
mod collections;
mod generation;
mod qa_pairs;
mod retrieval;

use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::Settings;
use crate::infrastructure::session_store::SessionStore;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Thin wrapper over the backend REST API. Attaches the bearer token from the
/// session store and applies one uniform timeout to every request. Endpoint
/// methods live in per-resource files, all `impl ApiClient`.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<dyn SessionStore>,
}

impl ApiClient {
    pub fn new(settings: &Settings, session: Arc<dyn SessionStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.api.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = Url::parse(&settings.api.base_url)
            .map_err(|e| AppError::Internal(format!("Invalid API base URL: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::Internal(format!("Invalid API path {}: {}", path, e)))
    }

    fn get(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self.http.get(self.url(path)?))
    }

    fn post(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self.http.post(self.url(path)?))
    }

    fn put(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self.http.put(self.url(path)?))
    }

    fn patch(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self.http.patch(self.url(path)?))
    }

    fn delete(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self.http.delete(self.url(path)?))
    }

    /// Attaches the stored bearer token when a session exists. Requests made
    /// without a session (login itself) simply go out unauthenticated.
    fn authorize(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        match self.session.load()? {
            Some(session) => Ok(builder.bearer_auth(session.token)),
            None => Ok(builder),
        }
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::NetworkError(format!("Request timed out: {}", e))
            } else {
                AppError::NetworkError(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = error_detail(response).await;
        match status {
            StatusCode::UNAUTHORIZED => Err(AppError::Unauthorized(message)),
            StatusCode::NOT_FOUND => Err(AppError::NotFound(message)),
            _ => Err(AppError::ApiError {
                status: status.as_u16(),
                message,
            }),
        }
    }

    async fn send_authorized(&self, builder: RequestBuilder) -> Result<Response> {
        let builder = self.authorize(builder)?;
        self.execute(builder).await
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| AppError::ParseError(format!("Failed to parse response: {}", e)))
    }
}

/// Pulls the backend's `{"detail": "..."}` message out of an error body,
/// falling back to the raw text.
async fn error_detail(response: Response) -> String {
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(body) => body["detail"]
            .as_str()
            .map(|s| s.to_string())
            .unwrap_or(text),
        Err(_) => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auth::{Credentials, Session};
    use crate::domain::entities::{GenerationRequest, SearchRequest};
    use crate::infrastructure::session_store::MemorySessionStore;
    use crate::interfaces::mock_server::{start_mock_api, MockApiServer};

    async fn setup() -> (MockApiServer, Arc<dyn SessionStore>, ApiClient) {
        let server = start_mock_api().await.unwrap();
        let settings = Settings::with_base_url(&server.base_url);
        let session: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let api = ApiClient::new(&settings, session.clone()).unwrap();
        (server, session, api)
    }

    async fn sign_in(api: &ApiClient, session: &Arc<dyn SessionStore>) {
        let response = api
            .login(&Credentials::new("demo", "password"))
            .await
            .unwrap();
        session
            .save(&Session {
                token: response.access_token,
                user: response.user,
            })
            .unwrap();
    }

    #[tokio::test]
    async fn test_search_returns_scored_documents() {
        let (_server, session, api) = setup().await;
        sign_in(&api, &session).await;

        let result = api
            .search_documents(&SearchRequest::new("air filter"))
            .await
            .unwrap();
        assert_eq!(result.page, 1);
        assert!(!result.documents.is_empty());
        assert_eq!(result.documents[0].id, "doc2");
        assert!(result.documents[0].relevance_score.unwrap() > 0.0);
        assert!(result.documents.len() <= 10);
    }

    #[tokio::test]
    async fn test_search_without_session_is_unauthorized() {
        let (_server, _session, api) = setup().await;
        let err = api
            .search_documents(&SearchRequest::new("anything"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_list_sources_paginates() {
        let (_server, session, api) = setup().await;
        sign_in(&api, &session).await;

        let page = api.list_sources(1, 20).await.unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, "memory");
        assert_eq!(page.pagination.total_count, 1);
        assert_eq!(page.pagination.total_pages, 1);
    }

    #[tokio::test]
    async fn test_generate_answer_uses_supplied_documents() {
        let (_server, session, api) = setup().await;
        sign_in(&api, &session).await;

        let documents = api
            .search_documents(&SearchRequest::new("maintenance"))
            .await
            .unwrap()
            .documents;
        let request = GenerationRequest::new("How often should filters be replaced?", documents);
        let response = api.generate_answer(&request).await.unwrap();

        assert!(response.answer.contains("How often should filters be replaced?"));
        assert_eq!(response.model_used, "gpt-4");
        assert_eq!(response.token_usage["total_tokens"], 550);
    }

    #[tokio::test]
    async fn test_logout_revokes_the_token() {
        let (_server, session, api) = setup().await;
        sign_in(&api, &session).await;

        assert!(api.current_user().await.is_ok());
        api.logout().await.unwrap();

        let err = api.current_user().await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_unknown_collection_maps_to_not_found() {
        let (_server, session, api) = setup().await;
        sign_in(&api, &session).await;

        let err = api.get_collection("missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
