use crate::domain::auth::Session;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::security::keyring::KeyringManager;
use std::sync::Mutex;

const TOKEN_KEY: &str = "auth_token";
const USER_KEY: &str = "auth_user";

/// Durable storage for the current session. The contract: token and user are
/// written together on login, removed together on logout, and their absence
/// means "not authenticated".
pub trait SessionStore: Send + Sync {
    fn save(&self, session: &Session) -> Result<()>;
    fn load(&self) -> Result<Option<Session>>;
    fn clear(&self) -> Result<()>;
}

/// Session storage backed by the OS keyring, two entries under one service
/// name. Used by the real application shell.
pub struct KeyringSessionStore {
    keyring: KeyringManager,
}

impl KeyringSessionStore {
    pub fn new(service: &str) -> Self {
        Self {
            keyring: KeyringManager::new(service),
        }
    }
}

impl SessionStore for KeyringSessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        let user_json = serde_json::to_string(&session.user)
            .map_err(|e| AppError::ParseError(format!("Failed to serialize user: {}", e)))?;

        self.keyring.set_secret(TOKEN_KEY, &session.token)?;
        self.keyring.set_secret(USER_KEY, &user_json)?;

        Ok(())
    }

    fn load(&self) -> Result<Option<Session>> {
        let token = self.keyring.get_secret(TOKEN_KEY)?;
        let user_json = self.keyring.get_secret(USER_KEY)?;

        // A half-written session (one key without the other) is treated as
        // absent rather than surfaced as an error.
        let (token, user_json) = match (token, user_json) {
            (Some(token), Some(user_json)) => (token, user_json),
            _ => return Ok(None),
        };

        let user = serde_json::from_str(&user_json)
            .map_err(|e| AppError::ParseError(format!("Failed to parse stored user: {}", e)))?;

        Ok(Some(Session { token, user }))
    }

    fn clear(&self) -> Result<()> {
        self.keyring.delete_secret(TOKEN_KEY)?;
        self.keyring.delete_secret(USER_KEY)?;
        Ok(())
    }
}

/// In-memory session storage for tests and ephemeral embedding.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        *self.inner.lock().unwrap() = Some(session.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<Session>> {
        Ok(self.inner.lock().unwrap().clone())
    }

    fn clear(&self) -> Result<()> {
        *self.inner.lock().unwrap() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auth::User;

    fn sample_session() -> Session {
        Session {
            token: "token-1".to_string(),
            user: User {
                id: "user1".to_string(),
                username: "demo".to_string(),
                email: "demo@example.com".to_string(),
                full_name: Some("Demo User".to_string()),
            },
        }
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemorySessionStore::new();
        assert!(store.load().unwrap().is_none());

        store.save(&sample_session()).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.token, "token-1");
        assert_eq!(loaded.user.username, "demo");
    }

    #[test]
    fn test_memory_store_clear_removes_token_and_user_together() {
        let store = MemorySessionStore::new();
        store.save(&sample_session()).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
