use serde::{Deserialize, Deserializer};
use tracing::{debug, info, warn};

use super::{setting, OidcError, OidcResult};
use crate::store::{keys, Store};

pub const GRANT_TYPE: &str = "authorization_code";

/// Token endpoint response. Every field is optional: whatever the IdP sends is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default, deserialize_with = "number_or_string")]
    pub expires_in: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// A zero number counts as absent, like an empty string does in `persist_tokens`.
fn number_or_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    })
}

/// The `code` query parameter of a callback request. Empty counts as missing.
pub fn extract_code(query: &str) -> Option<String> {
    let query = query.trim_start_matches('?');
    reqwest::Url::parse(&format!("http://callback.invalid/?{query}"))
        .ok()?
        .query_pairs()
        .find(|(name, _)| name == "code")
        .map(|(_, value)| value.into_owned())
        .filter(|code| !code.is_empty())
}

/// POST the code and verifier to the token endpoint as a form.
pub async fn exchange_code(
    http: &reqwest::Client,
    store: &Store,
    code: &str,
) -> OidcResult<TokenResponse> {
    let token_endpoint = setting(store, keys::TOKEN_ENDPOINT)?;
    let callback_endpoint = setting(store, keys::CALLBACK_ENDPOINT)?;
    let client_id = setting(store, keys::CLIENT_ID)?;
    let code_verifier = setting(store, keys::OIDC_CODE_VERIFIER)?;
    info!(%token_endpoint, %callback_endpoint, "Exchanging auth code for tokens");
    debug!(%code, %code_verifier, "Token request values");

    let res = http
        .post(token_endpoint)
        .form(&[
            ("client_id", client_id),
            ("grant_type", GRANT_TYPE),
            ("redirect_uri", callback_endpoint),
            ("code_verifier", code_verifier),
            ("code", code),
        ])
        .send()
        .await?;

    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        return Err(OidcError::TokenEndpoint { status, body });
    }

    let tokens: TokenResponse = res.json().await?;
    debug!(
        access_token = tokens.access_token.is_some(),
        id_token = tokens.id_token.is_some(),
        refresh_token = tokens.refresh_token.is_some(),
        expires_in = ?tokens.expires_in,
        "Token endpoint response"
    );
    Ok(tokens)
}

/// Store every token value present in the response and mark the session authenticated.
pub fn persist_tokens(store: &mut Store, tokens: &TokenResponse) -> anyhow::Result<()> {
    let fields = [
        (keys::ACCESS_TOKEN, &tokens.access_token),
        (keys::ID_TOKEN, &tokens.id_token),
        (keys::EXPIRES_IN, &tokens.expires_in),
        (keys::REFRESH_TOKEN, &tokens.refresh_token),
    ];
    for (key, value) in fields {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            store.set(key, value);
        }
    }
    store.set(keys::AUTHENTICATED, "true");
    store.save()
}

/// Handle a callback request query. Returns whether tokens were stored.
///
/// A missing code leaves storage untouched.
pub async fn handle_callback(
    http: &reqwest::Client,
    store: &mut Store,
    query: &str,
) -> OidcResult<bool> {
    let Some(code) = extract_code(query) else {
        warn!("Missing OIDC 'code' parameter");
        return Ok(false);
    };
    info!("Callback: received auth code to exchange for tokens");

    let tokens = exchange_code(http, store, &code).await?;
    persist_tokens(store, &tokens)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extract_code() {
        assert_eq!(extract_code("code=abc&state=foobarbaz"), Some("abc".to_string()));
        assert_eq!(extract_code("?state=x&code=a%2Fb"), Some("a/b".to_string()));
    }

    #[test]
    fn test_extract_code_missing_or_empty() {
        assert_eq!(extract_code(""), None);
        assert_eq!(extract_code("state=foobarbaz"), None);
        assert_eq!(extract_code("code="), None);
    }

    #[test]
    fn test_token_response_accepts_numeric_expiry() {
        let tokens: TokenResponse = serde_json::from_str(
            r#"{"access_token":"a","id_token":"i","expires_in":3600,"token_type":"Bearer"}"#,
        )
        .unwrap();
        assert_eq!(tokens.expires_in.as_deref(), Some("3600"));
        assert_eq!(tokens.refresh_token, None);
    }

    #[test]
    fn test_token_response_accepts_string_expiry() {
        let tokens: TokenResponse = serde_json::from_str(r#"{"expires_in":"60"}"#).unwrap();
        assert_eq!(tokens.expires_in.as_deref(), Some("60"));
        assert_eq!(tokens.access_token, None);
    }

    #[test]
    fn test_zero_expiry_is_not_stored() {
        let tokens: TokenResponse =
            serde_json::from_str(r#"{"access_token":"a","expires_in":0}"#).unwrap();
        assert_eq!(tokens.expires_in, None);

        let dir = TempDir::new().unwrap();
        let mut store = Store::open(dir.path()).unwrap();
        store.set(keys::EXPIRES_IN, "3600");
        persist_tokens(&mut store, &tokens).unwrap();

        assert_eq!(store.get(keys::EXPIRES_IN), Some("3600"));
        assert_eq!(store.get(keys::ACCESS_TOKEN), Some("a"));
    }

    #[test]
    fn test_persist_only_present_fields() {
        let dir = TempDir::new().unwrap();
        let mut store = Store::open(dir.path()).unwrap();
        store.set(keys::REFRESH_TOKEN, "older-refresh");

        let tokens = TokenResponse {
            access_token: Some("access".to_string()),
            id_token: None,
            expires_in: Some("3600".to_string()),
            refresh_token: None,
        };
        persist_tokens(&mut store, &tokens).unwrap();

        let reopened = Store::open(dir.path()).unwrap();
        assert_eq!(reopened.get(keys::ACCESS_TOKEN), Some("access"));
        assert_eq!(reopened.get(keys::ID_TOKEN), None);
        assert_eq!(reopened.get(keys::EXPIRES_IN), Some("3600"));
        assert_eq!(reopened.get(keys::REFRESH_TOKEN), Some("older-refresh"));
        assert_eq!(reopened.get(keys::AUTHENTICATED), Some("true"));
    }

    #[tokio::test]
    async fn test_missing_code_leaves_store_untouched() {
        let dir = TempDir::new().unwrap();
        let mut store = Store::open(dir.path()).unwrap();

        let stored = handle_callback(&reqwest::Client::new(), &mut store, "state=foobarbaz")
            .await
            .unwrap();

        assert!(!stored);
        assert!(store.is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_exchange_without_config() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let err = exchange_code(&reqwest::Client::new(), &store, "abc")
            .await
            .unwrap_err();
        assert!(matches!(err, OidcError::MissingSetting(keys::TOKEN_ENDPOINT)));
    }
}
