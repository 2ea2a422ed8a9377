use anyhow::{Context, Result};
use garde::Validate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::store::{keys, Store};

pub const CONFIG_ENV: &str = "OIDC_DEMO_CONFIG";
pub const STATE_DIR_ENV: &str = "OIDC_DEMO_STATE_DIR";
pub const PORT_ENV: &str = "OIDC_DEMO_PORT";

/// Runtime configuration document (`config.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[garde(length(min = 1))]
    pub client_id: String,
    #[garde(url)]
    pub authorize_endpoint: String,
    #[garde(url)]
    pub callback_endpoint: String,
    #[garde(url)]
    pub token_endpoint: String,
    #[garde(url)]
    pub protected_endpoint: String,
    #[garde(url)]
    pub logout_endpoint: String,
}

impl AppConfig {
    pub fn parse(data: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(data).context("Failed to parse config")?;
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid config: {e}"))?;
        Ok(config)
    }

    /// Rebuild from the seeded storage values, if all six are present.
    pub fn from_store(store: &Store) -> Option<Self> {
        Some(Self {
            client_id: store.get(keys::CLIENT_ID)?.to_string(),
            authorize_endpoint: store.get(keys::AUTHORIZATION_ENDPOINT)?.to_string(),
            callback_endpoint: store.get(keys::CALLBACK_ENDPOINT)?.to_string(),
            token_endpoint: store.get(keys::TOKEN_ENDPOINT)?.to_string(),
            protected_endpoint: store.get(keys::PROTECTED_ENDPOINT)?.to_string(),
            logout_endpoint: store.get(keys::LOGOUT_ENDPOINT)?.to_string(),
        })
    }
}

/// Where `config.json` comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Url(String),
    File(PathBuf),
}

impl ConfigSource {
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            ConfigSource::Url(raw.to_string())
        } else {
            ConfigSource::File(PathBuf::from(raw))
        }
    }
}

impl Default for ConfigSource {
    fn default() -> Self {
        ConfigSource::File(PathBuf::from("config.json"))
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Url(url) => write!(f, "{url}"),
            ConfigSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetch or read the config document and validate it.
pub async fn load_config(http: &reqwest::Client, source: &ConfigSource) -> Result<AppConfig> {
    debug!(%source, "Loading config");
    let data = match source {
        ConfigSource::Url(url) => {
            let res = http
                .get(url)
                .send()
                .await
                .with_context(|| format!("Fetching config from {url}"))?;
            if !res.status().is_success() {
                anyhow::bail!("Fetching config from {url} failed ({})", res.status());
            }
            res.text().await.context("Reading config response")?
        }
        ConfigSource::File(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?,
    };
    AppConfig::parse(&data)
}

/// Write the config values into storage.
pub fn seed_store(store: &mut Store, config: &AppConfig) -> Result<()> {
    store.set(keys::CLIENT_ID, &config.client_id);
    store.set(keys::AUTHORIZATION_ENDPOINT, &config.authorize_endpoint);
    store.set(keys::CALLBACK_ENDPOINT, &config.callback_endpoint);
    store.set(keys::TOKEN_ENDPOINT, &config.token_endpoint);
    store.set(keys::PROTECTED_ENDPOINT, &config.protected_endpoint);
    store.set(keys::LOGOUT_ENDPOINT, &config.logout_endpoint);
    store.save()
}

/// Load and seed. Failures are logged and the store keeps what it held.
pub async fn init_config(
    http: &reqwest::Client,
    store: &mut Store,
    source: &ConfigSource,
) -> bool {
    let loaded = load_config(http, source).await;
    seed_loaded(store, loaded, source)
}

/// Seed from an already finished load. Failures are logged and the store
/// keeps what it held.
///
/// Lets callers fetch without holding the store, since the document may be
/// served by the same process that owns it.
pub fn seed_loaded(store: &mut Store, loaded: Result<AppConfig>, source: &ConfigSource) -> bool {
    let result = loaded.and_then(|config| seed_store(store, &config).map(|()| config));
    match result {
        Ok(config) => {
            info!(client_id = %config.client_id, %source, "Config loaded");
            true
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), %source, "Config load failed");
            false
        }
    }
}

/// Config source with priority: ENV > default
pub fn get_config_source() -> ConfigSource {
    match std::env::var(CONFIG_ENV) {
        Ok(raw) if !raw.is_empty() => ConfigSource::parse(&raw),
        _ => ConfigSource::default(),
    }
}

/// State directory with priority: ENV > default
pub fn get_state_dir() -> PathBuf {
    match std::env::var(STATE_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => crate::store::default_state_dir(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
        "clientId": "demo-client",
        "authorizeEndpoint": "https://idp.example.com/oauth2/authorize",
        "callbackEndpoint": "http://localhost:8080/oauth2/callback",
        "tokenEndpoint": "https://idp.example.com/oauth2/token",
        "protectedEndpoint": "https://api.example.com/protected",
        "logoutEndpoint": "https://api.example.com/logout"
    }"#;

    #[test]
    fn test_parse_camel_case_document() {
        let config = AppConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.client_id, "demo-client");
        assert_eq!(config.token_endpoint, "https://idp.example.com/oauth2/token");
        assert_eq!(config.logout_endpoint, "https://api.example.com/logout");
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let err = AppConfig::parse(r#"{"clientId": "x"}"#).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn test_parse_rejects_bad_endpoint() {
        let data = SAMPLE.replace("https://api.example.com/logout", "not a url");
        let err = AppConfig::parse(&data).unwrap_err();
        assert!(err.to_string().contains("Invalid config"));
    }

    #[test]
    fn test_parse_rejects_empty_client_id() {
        let data = SAMPLE.replace("demo-client", "");
        assert!(AppConfig::parse(&data).is_err());
    }

    #[test]
    fn test_config_source_parse() {
        assert_eq!(
            ConfigSource::parse("https://app.example.com/config.json"),
            ConfigSource::Url("https://app.example.com/config.json".to_string())
        );
        assert_eq!(
            ConfigSource::parse("conf/config.json"),
            ConfigSource::File(PathBuf::from("conf/config.json"))
        );
    }

    #[test]
    fn test_seed_store_round_trips_through_storage() {
        let dir = TempDir::new().unwrap();
        let mut store = Store::open(dir.path()).unwrap();
        let config = AppConfig::parse(SAMPLE).unwrap();
        seed_store(&mut store, &config).unwrap();

        assert_eq!(
            store.get(keys::AUTHORIZATION_ENDPOINT),
            Some(config.authorize_endpoint.as_str())
        );
        let reopened = Store::open(dir.path()).unwrap();
        assert_eq!(AppConfig::from_store(&reopened), Some(config));
    }

    #[tokio::test]
    async fn test_init_config_keeps_state_on_failure() {
        let dir = TempDir::new().unwrap();
        let mut store = Store::open(dir.path()).unwrap();
        store.set(keys::CLIENT_ID, "previous");
        let source = ConfigSource::File(dir.path().join("missing.json"));

        let loaded = init_config(&reqwest::Client::new(), &mut store, &source).await;

        assert!(!loaded);
        assert_eq!(store.get(keys::CLIENT_ID), Some("previous"));
    }

    #[tokio::test]
    async fn test_init_config_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, SAMPLE).unwrap();
        let mut store = Store::open(dir.path()).unwrap();

        let source = ConfigSource::File(path);
        let loaded = init_config(&reqwest::Client::new(), &mut store, &source).await;

        assert!(loaded);
        assert_eq!(store.get(keys::CLIENT_ID), Some("demo-client"));
    }

    #[test]
    fn test_seed_loaded_skips_failed_load() {
        let dir = TempDir::new().unwrap();
        let mut store = Store::open(dir.path()).unwrap();
        store.set(keys::CLIENT_ID, "previous");

        let loaded = Err(anyhow::anyhow!("offline"));
        let seeded = seed_loaded(&mut store, loaded, &ConfigSource::default());

        assert!(!seeded);
        assert_eq!(store.get(keys::CLIENT_ID), Some("previous"));
        assert!(!store.path().exists());
    }
}
