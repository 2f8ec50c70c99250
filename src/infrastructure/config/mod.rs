use crate::domain::error::{AppError, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the backend, e.g. "http://127.0.0.1:8000".
    pub base_url: String,
    /// Uniform request timeout applied to every backend call.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Service name the OS keyring entries are registered under.
    pub keyring_service: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub api: ApiSettings,
    pub storage: StorageSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings {
                base_url: "http://127.0.0.1:8000".to_string(),
                timeout_secs: 10,
            },
            storage: StorageSettings {
                keyring_service: "Truthdesk".to_string(),
            },
        }
    }
}

impl Settings {
    /// Layered configuration: defaults, then `truthdesk.toml`, then
    /// `TRUTHDESK_`-prefixed environment variables (`TRUTHDESK_API__BASE_URL`).
    pub fn figment() -> Figment {
        dotenvy::dotenv().ok();
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("truthdesk.toml"))
            .merge(Env::prefixed("TRUTHDESK_").split("__"))
    }

    pub fn load() -> Result<Self> {
        Self::figment()
            .extract()
            .map_err(|e| AppError::Internal(format!("Failed to load settings: {}", e)))
    }

    pub fn with_base_url(base_url: &str) -> Self {
        let mut settings = Settings::default();
        settings.api.base_url = base_url.to_string();
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.api.base_url, "http://127.0.0.1:8000");
        assert_eq!(settings.api.timeout_secs, 10);
        assert_eq!(settings.storage.keyring_service, "Truthdesk");
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let figment = Figment::from(Serialized::defaults(Settings::default())).merge(
            Toml::string(
                r#"
                [api]
                base_url = "https://gt.example.com"
                timeout_secs = 30
                "#,
            ),
        );

        let settings: Settings = figment.extract().unwrap();
        assert_eq!(settings.api.base_url, "https://gt.example.com");
        assert_eq!(settings.api.timeout_secs, 30);
        // Untouched sections keep their defaults.
        assert_eq!(settings.storage.keyring_service, "Truthdesk");
    }
}
