use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Storage key names.
pub mod keys {
    pub const CLIENT_ID: &str = "client_id";
    pub const AUTHORIZATION_ENDPOINT: &str = "authorization_endpoint";
    pub const CALLBACK_ENDPOINT: &str = "callback_endpoint";
    pub const TOKEN_ENDPOINT: &str = "token_endpoint";
    pub const PROTECTED_ENDPOINT: &str = "protected_endpoint";
    pub const LOGOUT_ENDPOINT: &str = "logout_endpoint";

    pub const OIDC_STATE: &str = "oidc_state";
    pub const OIDC_CODE_VERIFIER: &str = "oidc_code_verifier";

    pub const ACCESS_TOKEN: &str = "access_token";
    pub const ID_TOKEN: &str = "id_token";
    pub const REFRESH_TOKEN: &str = "refresh_token";
    pub const EXPIRES_IN: &str = "expires_in";
    pub const AUTHENTICATED: &str = "authenticated";
}

const STORAGE_FILE: &str = "storage.json";

/// Flat string key/value state persisted as a JSON object on disk.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

/// Default state directory: `<data_local_dir>/oidc-demo`.
pub fn default_state_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("oidc-demo")
}

impl Store {
    /// Open the store in `dir`. A missing file is an empty store.
    pub fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(STORAGE_FILE);
        if !path.exists() {
            return Ok(Self {
                path,
                entries: BTreeMap::new(),
            });
        }
        let data = std::fs::read_to_string(&path).context("Reading storage file")?;
        let entries: BTreeMap<String, String> =
            serde_json::from_str(&data).context("Parsing storage file")?;
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Creating storage directory")?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, json).context("Writing storage file")?;
        Ok(())
    }
}
