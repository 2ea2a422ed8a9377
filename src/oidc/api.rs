use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use tracing::{info, warn};

use super::{setting, OidcResult};
use crate::config::{self, AppConfig, ConfigSource};
use crate::store::{keys, Store};

async fn bearer_request(
    http: &reqwest::Client,
    store: &Store,
    method: Method,
    endpoint: &str,
) -> OidcResult<StatusCode> {
    let access_token = store.get(keys::ACCESS_TOKEN).unwrap_or_default();
    if access_token.is_empty() {
        warn!(%endpoint, "No access token in storage, sending an empty bearer");
    }
    let res = http
        .request(method, endpoint)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {access_token}"))
        .send()
        .await?;
    info!(%endpoint, status = %res.status(), "Bearer request completed");
    Ok(res.status())
}

/// GET the protected endpoint with the stored access token.
pub async fn call_protected(http: &reqwest::Client, store: &Store) -> OidcResult<StatusCode> {
    let endpoint = setting(store, keys::PROTECTED_ENDPOINT)?;
    info!(%endpoint, "Calling protected endpoint");
    bearer_request(http, store, Method::GET, endpoint).await
}

/// POST to the logout endpoint. Any response marks the session unauthenticated.
pub async fn logout(http: &reqwest::Client, store: &mut Store) -> OidcResult<StatusCode> {
    let endpoint = setting(store, keys::LOGOUT_ENDPOINT)?.to_string();
    info!(%endpoint, "Logging out");
    let status = bearer_request(http, store, Method::POST, &endpoint).await?;
    store.set(keys::AUTHENTICATED, "false");
    store.save()?;
    Ok(status)
}

/// Clear all stored state, then seed it from a freshly loaded config.
///
/// The load happens before the store is borrowed; a failed load leaves the
/// store empty.
pub fn reset(
    store: &mut Store,
    loaded: anyhow::Result<AppConfig>,
    source: &ConfigSource,
) -> anyhow::Result<()> {
    info!("Resetting app state");
    store.clear();
    store.save()?;
    config::seed_loaded(store, loaded, source);
    Ok(())
}
