pub mod app;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

pub use app::{init_tracing, AppContext};
pub use application::use_cases::auth_service::{AuthService, AuthState};
pub use application::use_cases::collection_service::{CollectionService, CollectionsState};
pub use application::use_cases::document_filters;
pub use application::use_cases::ui_state::{UiState, UiStateService};
pub use domain::auth::{AuthPhase, Credentials, Session, User};
pub use domain::entities::{
    Collection, CollectionInput, Document, DocumentSource, QaPair, QaPairDraft, QaPairUpdate,
    QaStatus, SourceInfo,
};
pub use domain::error::{AppError, Result};
pub use infrastructure::api::ApiClient;
pub use infrastructure::config::Settings;
pub use infrastructure::session_store::{
    KeyringSessionStore, MemorySessionStore, SessionStore,
};
