use crate::application::use_cases::validation::validate_input;
use crate::domain::entities::{
    Collection, CollectionInput, QaPair, QaPairDraft, QaPairUpdate, QaStatus,
};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::api::ApiClient;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Local cache of collections and the QA pairs of the current selection.
/// The cache always reflects the last known server state: mutations apply
/// the server's response (append / replace-by-id / remove-by-id), never a
/// locally fabricated entity.
#[derive(Debug, Clone, Default)]
pub struct CollectionsState {
    pub collections: Vec<Collection>,
    pub current: Option<Collection>,
    pub qa_pairs: Vec<QaPair>,
    pub loading: bool,
    pub error: Option<String>,
}

/// CRUD over collections and their QA pairs. Read-only fetches record
/// failures in `error` and keep prior data visible; mutations additionally
/// re-raise so callers can run their own recovery.
pub struct CollectionService {
    api: Arc<ApiClient>,
    state: Mutex<CollectionsState>,
    mutating: AtomicBool,
}

/// Clears the in-flight flag when a mutation ends, including early error
/// returns.
struct MutationGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl CollectionService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            state: Mutex::new(CollectionsState::default()),
            mutating: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self) -> CollectionsState {
        self.state.lock().unwrap().clone()
    }

    /// Rejects a mutation while another one is still in flight, so a double
    /// submit cannot issue two backend writes. Fetches are not guarded.
    fn begin_mutation(&self) -> Result<MutationGuard<'_>> {
        if self
            .mutating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AppError::ValidationError(
                "Another update is still in progress".to_string(),
            ));
        }
        Ok(MutationGuard {
            flag: &self.mutating,
        })
    }

    fn begin_request(&self) {
        let mut state = self.state.lock().unwrap();
        state.loading = true;
        state.error = None;
    }

    fn fail(&self, message: &str) {
        let mut state = self.state.lock().unwrap();
        state.error = Some(message.to_string());
        state.loading = false;
    }

    pub async fn fetch_collections(&self) {
        self.begin_request();
        match self.api.list_collections().await {
            Ok(collections) => {
                debug!("Fetched {} collections", collections.len());
                let mut state = self.state.lock().unwrap();
                state.collections = collections;
                state.loading = false;
            }
            Err(err) => {
                warn!("Failed to load collections: {}", err);
                self.fail("Failed to load collections. Please try again.");
            }
        }
    }

    /// Hydrates the current selection (and its list entry, when present).
    pub async fn fetch_collection(&self, id: &str) {
        self.begin_request();
        match self.api.get_collection(id).await {
            Ok(collection) => {
                let mut state = self.state.lock().unwrap();
                if let Some(entry) = state.collections.iter_mut().find(|c| c.id == collection.id) {
                    *entry = collection.clone();
                }
                state.current = Some(collection);
                state.loading = false;
            }
            Err(err) => {
                warn!("Failed to load collection {}: {}", id, err);
                self.fail("Failed to load collection. Please try again.");
            }
        }
    }

    pub async fn fetch_qa_pairs(&self, collection_id: &str) {
        self.begin_request();
        match self.api.list_qa_pairs(collection_id).await {
            Ok(qa_pairs) => {
                debug!(
                    "Fetched {} QA pairs for collection {}",
                    qa_pairs.len(),
                    collection_id
                );
                let mut state = self.state.lock().unwrap();
                state.qa_pairs = qa_pairs;
                state.loading = false;
            }
            Err(err) => {
                warn!("Failed to load QA pairs for {}: {}", collection_id, err);
                self.fail("Failed to load QA pairs. Please try again.");
            }
        }
    }

    pub async fn create_collection(&self, input: &CollectionInput) -> Result<Collection> {
        validate_input(input)?;
        let _guard = self.begin_mutation()?;
        self.begin_request();

        match self.api.create_collection(input).await {
            Ok(collection) => {
                info!("Created collection {}", collection.id);
                let mut state = self.state.lock().unwrap();
                state.collections.push(collection.clone());
                state.loading = false;
                Ok(collection)
            }
            Err(err) => {
                warn!("Failed to create collection: {}", err);
                self.fail("Failed to create collection. Please try again.");
                Err(err)
            }
        }
    }

    pub async fn update_collection(&self, id: &str, input: &CollectionInput) -> Result<Collection> {
        validate_input(input)?;
        let _guard = self.begin_mutation()?;
        self.begin_request();

        match self.api.update_collection(id, input).await {
            Ok(collection) => {
                let mut state = self.state.lock().unwrap();
                if let Some(entry) = state.collections.iter_mut().find(|c| c.id == id) {
                    *entry = collection.clone();
                }
                if state.current.as_ref().map(|c| c.id.as_str()) == Some(id) {
                    state.current = Some(collection.clone());
                }
                state.loading = false;
                Ok(collection)
            }
            Err(err) => {
                warn!("Failed to update collection {}: {}", id, err);
                self.fail("Failed to update collection. Please try again.");
                Err(err)
            }
        }
    }

    pub async fn delete_collection(&self, id: &str) -> Result<()> {
        let _guard = self.begin_mutation()?;
        self.begin_request();

        match self.api.delete_collection(id).await {
            Ok(()) => {
                info!("Deleted collection {}", id);
                let mut state = self.state.lock().unwrap();
                state.collections.retain(|c| c.id != id);
                if state.current.as_ref().map(|c| c.id.as_str()) == Some(id) {
                    state.current = None;
                    state.qa_pairs.clear();
                }
                state.loading = false;
                Ok(())
            }
            Err(err) => {
                warn!("Failed to delete collection {}: {}", id, err);
                self.fail("Failed to delete collection. Please try again.");
                Err(err)
            }
        }
    }

    pub async fn create_qa_pair(&self, collection_id: &str, draft: &QaPairDraft) -> Result<QaPair> {
        validate_input(draft)?;
        let _guard = self.begin_mutation()?;
        self.begin_request();

        match self.api.create_qa_pair(collection_id, draft).await {
            Ok(pair) => {
                info!("Created QA pair {} in {}", pair.id, collection_id);
                let mut state = self.state.lock().unwrap();
                let is_current =
                    state.current.as_ref().map(|c| c.id.as_str()) == Some(collection_id);
                if is_current {
                    state.qa_pairs.push(pair.clone());
                }
                adjust_counts(&mut state, collection_id, pair.status, 1);
                state.loading = false;
                Ok(pair)
            }
            Err(err) => {
                warn!("Failed to create QA pair in {}: {}", collection_id, err);
                self.fail("Failed to create QA pair. Please try again.");
                Err(err)
            }
        }
    }

    pub async fn update_qa_pair(&self, id: &str, update: &QaPairUpdate) -> Result<QaPair> {
        let _guard = self.begin_mutation()?;
        self.begin_request();

        match self.api.update_qa_pair(id, update).await {
            Ok(pair) => {
                let mut state = self.state.lock().unwrap();
                let previous_status = state.qa_pairs.iter().find(|p| p.id == id).map(|p| p.status);
                if let Some(entry) = state.qa_pairs.iter_mut().find(|p| p.id == id) {
                    *entry = pair.clone();
                }
                if let Some(previous) = previous_status {
                    if previous != pair.status {
                        shift_status_counts(&mut state, &pair.collection_id, previous, pair.status);
                    }
                }
                state.loading = false;
                Ok(pair)
            }
            Err(err) => {
                warn!("Failed to update QA pair {}: {}", id, err);
                self.fail("Failed to update QA pair. Please try again.");
                Err(err)
            }
        }
    }

    pub async fn approve_qa_pair(&self, id: &str) -> Result<QaPair> {
        self.update_qa_pair(id, &QaPairUpdate::status(QaStatus::Approved))
            .await
    }

    pub async fn reject_qa_pair(&self, id: &str) -> Result<QaPair> {
        self.update_qa_pair(id, &QaPairUpdate::status(QaStatus::Rejected))
            .await
    }

    /// Sends the pair back for rework. The comment is merged into the pair's
    /// metadata under `revision_comments`; pre-existing keys survive.
    pub async fn request_revision(&self, id: &str, comment: &str) -> Result<QaPair> {
        let mut metadata = Map::new();
        metadata.insert(
            "revision_comments".to_string(),
            Value::String(comment.to_string()),
        );
        let update = QaPairUpdate {
            status: Some(QaStatus::RevisionRequested),
            metadata: Some(metadata),
            ..Default::default()
        };
        self.update_qa_pair(id, &update).await
    }

    pub async fn delete_qa_pair(&self, id: &str) -> Result<()> {
        let _guard = self.begin_mutation()?;
        self.begin_request();

        let removed = {
            let state = self.state.lock().unwrap();
            state.qa_pairs.iter().find(|p| p.id == id).cloned()
        };

        match self.api.delete_qa_pair(id).await {
            Ok(()) => {
                info!("Deleted QA pair {}", id);
                let mut state = self.state.lock().unwrap();
                state.qa_pairs.retain(|p| p.id != id);
                if let Some(pair) = removed {
                    adjust_counts(&mut state, &pair.collection_id, pair.status, -1);
                }
                state.loading = false;
                Ok(())
            }
            Err(err) => {
                warn!("Failed to delete QA pair {}: {}", id, err);
                self.fail("Failed to delete QA pair. Please try again.");
                Err(err)
            }
        }
    }

    /// Resets the detail-view slice of the cache, used when navigating away.
    pub fn clear_current_collection(&self) {
        let mut state = self.state.lock().unwrap();
        state.current = None;
        state.qa_pairs.clear();
    }
}

fn adjust_counts(state: &mut CollectionsState, collection_id: &str, status: QaStatus, delta: i64) {
    if let Some(entry) = state.collections.iter_mut().find(|c| c.id == collection_id) {
        apply_count_delta(entry, status, delta);
    }
    if let Some(current) = state.current.as_mut() {
        if current.id == collection_id {
            apply_count_delta(current, status, delta);
        }
    }
}

fn apply_count_delta(collection: &mut Collection, status: QaStatus, delta: i64) {
    collection.document_count = (collection.document_count + delta).max(0);
    let counter = collection
        .status_counts
        .entry(status.as_str().to_string())
        .or_insert(0);
    *counter = (*counter + delta).max(0);
}

fn shift_status_counts(
    state: &mut CollectionsState,
    collection_id: &str,
    from: QaStatus,
    to: QaStatus,
) {
    if let Some(entry) = state.collections.iter_mut().find(|c| c.id == collection_id) {
        shift_status_bucket(entry, from, to);
    }
    if let Some(current) = state.current.as_mut() {
        if current.id == collection_id {
            shift_status_bucket(current, from, to);
        }
    }
}

fn shift_status_bucket(collection: &mut Collection, from: QaStatus, to: QaStatus) {
    if let Some(counter) = collection.status_counts.get_mut(from.as_str()) {
        *counter = (*counter - 1).max(0);
    }
    *collection
        .status_counts
        .entry(to.as_str().to_string())
        .or_insert(0) += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::auth_service::AuthService;
    use crate::infrastructure::config::Settings;
    use crate::infrastructure::session_store::{MemorySessionStore, SessionStore};
    use crate::interfaces::mock_server::{start_mock_api, MockApiServer};
    use serde_json::json;

    async fn setup() -> (MockApiServer, CollectionService) {
        let server = start_mock_api().await.unwrap();
        let settings = Settings::with_base_url(&server.base_url);
        let session: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let api = Arc::new(ApiClient::new(&settings, session.clone()).unwrap());

        let auth = AuthService::new(api.clone(), session);
        auth.login("demo", "password").await.unwrap();

        (server, CollectionService::new(api))
    }

    #[tokio::test]
    async fn test_create_and_fetch_collections() {
        let (_server, service) = setup().await;

        let created = service
            .create_collection(&CollectionInput::new("Maintenance FAQs", Some("Pump docs")))
            .await
            .unwrap();
        assert_eq!(created.document_count, 0);
        assert_eq!(service.snapshot().collections.len(), 1);

        // Refetching replaces the cache with the server's view.
        service.fetch_collections().await;
        let state = service.snapshot();
        assert_eq!(state.collections.len(), 1);
        assert_eq!(state.collections[0].name, "Maintenance FAQs");
        assert!(state.error.is_none());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_create_collection_with_empty_name_is_rejected_locally() {
        let (_server, service) = setup().await;
        let err = service
            .create_collection(&CollectionInput::new("", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_create_qa_pair_appends_and_bumps_count() {
        let (_server, service) = setup().await;

        let collection = service
            .create_collection(&CollectionInput::new("Safety", None))
            .await
            .unwrap();
        service.fetch_collection(&collection.id).await;
        service.fetch_qa_pairs(&collection.id).await;

        service
            .create_qa_pair(
                &collection.id,
                &QaPairDraft::new("What PPE is required?", "Gloves and goggles."),
            )
            .await
            .unwrap();

        let state = service.snapshot();
        assert_eq!(state.qa_pairs.len(), 1);
        assert_eq!(state.current.as_ref().unwrap().document_count, 1);
        assert_eq!(state.collections[0].document_count, 1);
        assert_eq!(
            state.current.as_ref().unwrap().status_counts["ready_for_review"],
            1
        );
    }

    #[tokio::test]
    async fn test_request_revision_preserves_existing_metadata() {
        let (_server, service) = setup().await;

        let collection = service
            .create_collection(&CollectionInput::new("Manuals", None))
            .await
            .unwrap();
        service.fetch_collection(&collection.id).await;

        let mut draft = QaPairDraft::new("How often to replace the filter?", "Every 12 months.");
        draft
            .metadata
            .insert("difficulty".to_string(), json!("easy"));
        let pair = service.create_qa_pair(&collection.id, &draft).await.unwrap();

        let revised = service.request_revision(&pair.id, "fix X").await.unwrap();
        assert_eq!(revised.status, QaStatus::RevisionRequested);
        assert_eq!(revised.metadata["revision_comments"], json!("fix X"));
        assert_eq!(revised.metadata["difficulty"], json!("easy"));
    }

    #[tokio::test]
    async fn test_approval_archives_revision_feedback() {
        let (_server, service) = setup().await;

        let collection = service
            .create_collection(&CollectionInput::new("Manuals", None))
            .await
            .unwrap();
        service.fetch_collection(&collection.id).await;

        let pair = service
            .create_qa_pair(&collection.id, &QaPairDraft::new("Q", "A"))
            .await
            .unwrap();
        service.request_revision(&pair.id, "tighten wording").await.unwrap();

        let approved = service.approve_qa_pair(&pair.id).await.unwrap();
        assert_eq!(approved.status, QaStatus::Approved);
        assert!(approved.metadata.get("revision_comments").is_none());
        let history = approved.metadata["revision_history"].as_array().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0]["revision_feedback"], json!("tighten wording"));

        // Status buckets followed the transition.
        let state = service.snapshot();
        let counts = &state.current.as_ref().unwrap().status_counts;
        assert_eq!(counts["approved"], 1);
        assert_eq!(counts.get("revision_requested").copied().unwrap_or(0), 0);
    }

    #[tokio::test]
    async fn test_delete_collection_clears_current_selection() {
        let (_server, service) = setup().await;

        let collection = service
            .create_collection(&CollectionInput::new("Scratch", None))
            .await
            .unwrap();
        service.fetch_collection(&collection.id).await;
        assert!(service.snapshot().current.is_some());

        service.delete_collection(&collection.id).await.unwrap();
        let state = service.snapshot();
        assert!(state.collections.is_empty());
        assert!(state.current.is_none());
        assert!(state.qa_pairs.is_empty());
    }

    #[tokio::test]
    async fn test_delete_qa_pair_decrements_count() {
        let (_server, service) = setup().await;

        let collection = service
            .create_collection(&CollectionInput::new("Specs", None))
            .await
            .unwrap();
        service.fetch_collection(&collection.id).await;
        let pair = service
            .create_qa_pair(&collection.id, &QaPairDraft::new("Q", "A"))
            .await
            .unwrap();
        assert_eq!(service.snapshot().current.as_ref().unwrap().document_count, 1);

        service.delete_qa_pair(&pair.id).await.unwrap();
        let state = service.snapshot();
        assert!(state.qa_pairs.is_empty());
        assert_eq!(state.current.as_ref().unwrap().document_count, 0);
    }

    #[tokio::test]
    async fn test_update_collection_refreshes_list_and_current() {
        let (_server, service) = setup().await;

        let collection = service
            .create_collection(&CollectionInput::new("Old name", None))
            .await
            .unwrap();
        service.fetch_collection(&collection.id).await;

        service
            .update_collection(
                &collection.id,
                &CollectionInput::new("New name", Some("Renamed")),
            )
            .await
            .unwrap();

        let state = service.snapshot();
        assert_eq!(state.collections[0].name, "New name");
        assert_eq!(state.current.as_ref().unwrap().name, "New name");
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_prior_data_and_sets_error() {
        let (server, service) = setup().await;

        service
            .create_collection(&CollectionInput::new("Kept", None))
            .await
            .unwrap();
        server.stop().await;

        service.fetch_collections().await;
        let state = service.snapshot();
        assert_eq!(state.collections.len(), 1);
        assert_eq!(
            state.error.as_deref(),
            Some("Failed to load collections. Please try again.")
        );
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_overlapping_mutations_are_rejected() {
        let (_server, service) = setup().await;

        let guard = service.begin_mutation().unwrap();
        let err = service
            .create_collection(&CollectionInput::new("Blocked", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        drop(guard);

        // Once the first mutation finishes, the next one goes through.
        service
            .create_collection(&CollectionInput::new("Allowed", None))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_clear_current_collection() {
        let (_server, service) = setup().await;

        let collection = service
            .create_collection(&CollectionInput::new("Detail", None))
            .await
            .unwrap();
        service.fetch_collection(&collection.id).await;
        service
            .create_qa_pair(&collection.id, &QaPairDraft::new("Q", "A"))
            .await
            .unwrap();

        service.clear_current_collection();
        let state = service.snapshot();
        assert!(state.current.is_none());
        assert!(state.qa_pairs.is_empty());
        // The list itself is untouched.
        assert_eq!(state.collections.len(), 1);
    }
}
