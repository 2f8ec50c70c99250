use crate::application::{AuthService, CollectionService, UiStateService};
use crate::domain::error::Result;
use crate::infrastructure::api::ApiClient;
use crate::infrastructure::config::Settings;
use crate::infrastructure::session_store::{KeyringSessionStore, SessionStore};
use std::sync::Arc;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();
}

/// Everything a presentation layer needs, wired once at start-up: settings,
/// the HTTP client, and the state containers. Containers are injected
/// explicitly rather than reached for as globals, so tests can build
/// isolated copies.
pub struct AppContext {
    pub settings: Settings,
    pub api: Arc<ApiClient>,
    pub auth: Arc<AuthService>,
    pub collections: Arc<CollectionService>,
    pub ui: Arc<UiStateService>,
}

impl AppContext {
    /// Production wiring: layered settings and OS-keyring session storage.
    pub fn new() -> Result<Self> {
        let settings = Settings::load()?;
        let session: Arc<dyn SessionStore> =
            Arc::new(KeyringSessionStore::new(&settings.storage.keyring_service));
        Self::with_session_store(settings, session)
    }

    /// Wiring with a caller-supplied session store, used by tests and by
    /// embedders that manage credentials themselves.
    pub fn with_session_store(settings: Settings, session: Arc<dyn SessionStore>) -> Result<Self> {
        let api = Arc::new(ApiClient::new(&settings, session.clone())?);
        let auth = Arc::new(AuthService::new(api.clone(), session));
        let collections = Arc::new(CollectionService::new(api.clone()));
        let ui = Arc::new(UiStateService::new());

        Ok(Self {
            settings,
            api,
            auth,
            collections,
            ui,
        })
    }
}
