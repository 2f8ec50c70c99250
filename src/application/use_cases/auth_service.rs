use crate::application::use_cases::validation::validate_input;
use crate::domain::auth::{AuthPhase, Credentials, Session, User};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::api::ApiClient;
use crate::infrastructure::session_store::SessionStore;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";
const GENERIC_LOGIN_MESSAGE: &str = "Login failed. Please try again.";

/// Current authentication snapshot. `user` is populated exactly when the
/// phase is `Authenticated`.
#[derive(Debug, Clone)]
pub struct AuthState {
    pub phase: AuthPhase,
    pub user: Option<User>,
    pub error: Option<String>,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.phase == AuthPhase::Authenticated
    }
}

/// Single source of truth for "who is logged in". Starts in `Loading` until
/// `check_auth_status` has resolved the stored session one way or the other.
pub struct AuthService {
    api: Arc<ApiClient>,
    session: Arc<dyn SessionStore>,
    state: Mutex<AuthState>,
}

impl AuthService {
    pub fn new(api: Arc<ApiClient>, session: Arc<dyn SessionStore>) -> Self {
        Self {
            api,
            session,
            state: Mutex::new(AuthState {
                phase: AuthPhase::Loading,
                user: None,
                error: None,
            }),
        }
    }

    pub fn snapshot(&self) -> AuthState {
        self.state.lock().unwrap().clone()
    }

    /// Authenticates against the backend and persists the session. A 401
    /// produces the fixed invalid-credentials message; any other failure a
    /// generic one. Failures keep the previous signed-out state and are
    /// re-raised so the caller can react (stay on the form, focus a field).
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let credentials = Credentials::new(username, password);
        validate_input(&credentials)?;

        {
            let mut state = self.state.lock().unwrap();
            state.phase = AuthPhase::Loading;
            state.error = None;
        }

        match self.api.login(&credentials).await {
            Ok(response) => {
                let session = Session {
                    token: response.access_token,
                    user: response.user.clone(),
                };
                if let Err(err) = self.session.save(&session) {
                    self.reset_to_signed_out(Some(GENERIC_LOGIN_MESSAGE.to_string()));
                    return Err(err);
                }

                info!("User {} logged in", response.user.username);
                let mut state = self.state.lock().unwrap();
                state.phase = AuthPhase::Authenticated;
                state.user = Some(response.user.clone());
                state.error = None;
                Ok(response.user)
            }
            Err(err) => {
                let message = match &err {
                    AppError::Unauthorized(_) => INVALID_CREDENTIALS_MESSAGE.to_string(),
                    _ => GENERIC_LOGIN_MESSAGE.to_string(),
                };
                warn!("Login failed for {}: {}", username, err);
                self.reset_to_signed_out(Some(message));
                Err(err)
            }
        }
    }

    /// Ends the session. The backend call is best effort; local state and
    /// durable storage are cleared regardless. Navigation is the caller's
    /// concern.
    pub async fn logout(&self) -> Result<()> {
        if let Err(err) = self.api.logout().await {
            debug!("Logout request failed, clearing session anyway: {}", err);
        }

        self.session.clear()?;
        self.reset_to_signed_out(None);
        info!("User logged out");
        Ok(())
    }

    /// Resolves the stored session on application start. A token the backend
    /// no longer accepts is treated as invalid and removed; the user just
    /// sees the login screen, never an error.
    pub async fn check_auth_status(&self) {
        let stored = match self.session.load() {
            Ok(stored) => stored,
            Err(err) => {
                warn!("Failed to read stored session: {}", err);
                None
            }
        };

        let stored = match stored {
            Some(stored) => stored,
            None => {
                self.reset_to_signed_out(None);
                return;
            }
        };

        match self.api.current_user().await {
            Ok(user) => {
                // Refresh the stored profile alongside the token.
                let session = Session {
                    token: stored.token,
                    user: user.clone(),
                };
                if let Err(err) = self.session.save(&session) {
                    warn!("Failed to refresh stored session: {}", err);
                }

                debug!("Restored session for {}", user.username);
                let mut state = self.state.lock().unwrap();
                state.phase = AuthPhase::Authenticated;
                state.user = Some(user);
                state.error = None;
            }
            Err(err) => {
                debug!("Stored token rejected, clearing session: {}", err);
                if let Err(clear_err) = self.session.clear() {
                    warn!("Failed to clear stored session: {}", clear_err);
                }
                self.reset_to_signed_out(None);
            }
        }
    }

    /// Direct assignment for profile refreshes completing outside the login
    /// flow.
    pub fn set_user(&self, user: User) {
        self.state.lock().unwrap().user = Some(user);
    }

    fn reset_to_signed_out(&self, error: Option<String>) {
        let mut state = self.state.lock().unwrap();
        state.phase = AuthPhase::Unauthenticated;
        state.user = None;
        state.error = error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::Settings;
    use crate::infrastructure::session_store::MemorySessionStore;
    use crate::interfaces::mock_server::{start_mock_api, MockApiServer};

    async fn setup() -> (MockApiServer, Arc<dyn SessionStore>, AuthService) {
        let server = start_mock_api().await.unwrap();
        let settings = Settings::with_base_url(&server.base_url);
        let session: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let api = Arc::new(ApiClient::new(&settings, session.clone()).unwrap());
        let auth = AuthService::new(api, session.clone());
        (server, session, auth)
    }

    #[tokio::test]
    async fn test_initial_phase_is_loading() {
        let (_server, _session, auth) = setup().await;
        assert_eq!(auth.snapshot().phase, AuthPhase::Loading);
    }

    #[tokio::test]
    async fn test_login_with_demo_credentials() {
        let (_server, session, auth) = setup().await;

        let user = auth.login("demo", "password").await.unwrap();
        assert_eq!(user.username, "demo");

        let state = auth.snapshot();
        assert!(state.is_authenticated());
        assert_eq!(state.user.as_ref().unwrap().email, "demo@example.com");
        assert!(state.error.is_none());

        // Token and user were persisted together.
        let stored = session.load().unwrap().unwrap();
        assert!(!stored.token.is_empty());
        assert_eq!(stored.user.username, "demo");
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let (_server, session, auth) = setup().await;

        let err = auth.login("demo", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let state = auth.snapshot();
        assert!(!state.is_authenticated());
        assert!(state.user.is_none());
        assert_eq!(state.error.as_deref(), Some(INVALID_CREDENTIALS_MESSAGE));
        assert!(session.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_with_empty_fields_never_reaches_the_network() {
        let (_server, _session, auth) = setup().await;

        let err = auth.login("", "password").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        // The validation failure is field-level, not a container error.
        assert!(auth.snapshot().error.is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_state_and_storage() {
        let (server, session, auth) = setup().await;

        auth.login("demo", "password").await.unwrap();
        auth.logout().await.unwrap();

        let state = auth.snapshot();
        assert!(!state.is_authenticated());
        assert!(state.user.is_none());
        assert!(state.error.is_none());
        assert!(session.load().unwrap().is_none());

        server.stop().await;
    }

    #[tokio::test]
    async fn test_check_auth_status_restores_a_valid_session() {
        let (server, session, auth) = setup().await;
        auth.login("admin", "admin123").await.unwrap();

        // A fresh service sharing the same store, as on application restart.
        let settings = Settings::with_base_url(&server.base_url);
        let api = Arc::new(ApiClient::new(&settings, session.clone()).unwrap());
        let restarted = AuthService::new(api, session.clone());

        restarted.check_auth_status().await;
        let state = restarted.snapshot();
        assert!(state.is_authenticated());
        assert_eq!(state.user.unwrap().username, "admin");
    }

    #[tokio::test]
    async fn test_check_auth_status_discards_an_invalid_token() {
        let (_server, session, auth) = setup().await;

        session
            .save(&Session {
                token: "stale-token".to_string(),
                user: User {
                    id: "user1".to_string(),
                    username: "demo".to_string(),
                    email: "demo@example.com".to_string(),
                    full_name: None,
                },
            })
            .unwrap();

        auth.check_auth_status().await;
        let state = auth.snapshot();
        assert!(!state.is_authenticated());
        // Silent sign-out: no user-facing error.
        assert!(state.error.is_none());
        assert!(session.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_check_auth_status_without_stored_session() {
        let (_server, _session, auth) = setup().await;
        auth.check_auth_status().await;
        assert_eq!(auth.snapshot().phase, AuthPhase::Unauthenticated);
    }

    #[tokio::test]
    async fn test_set_user_updates_profile() {
        let (_server, _session, auth) = setup().await;
        auth.login("demo", "password").await.unwrap();

        auth.set_user(User {
            id: "user1".to_string(),
            username: "demo".to_string(),
            email: "demo@example.com".to_string(),
            full_name: Some("Demo U.".to_string()),
        });

        let state = auth.snapshot();
        assert_eq!(state.user.as_ref().unwrap().full_name.as_deref(), Some("Demo U."));
        assert!(state.is_authenticated());
    }
}
