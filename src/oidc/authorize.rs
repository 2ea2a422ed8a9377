use reqwest::Url;
use tracing::{debug, info};

use super::{setting, OidcError, OidcResult};
use crate::pkce::{self, PkceParams};
use crate::store::{keys, Store};

pub const RESPONSE_TYPE: &str = "code";

/// OIDC scopes: sign-in, profile claims and email.
pub const SCOPE: &str = "openid profile email";

/// Query parameters of the authorization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRequest {
    pub client_id: String,
    pub redirect_uri: String,
    pub pkce: PkceParams,
}

impl AuthRequest {
    /// Ordered `(name, value)` pairs as sent to the IdP.
    pub fn query_pairs(&self) -> [(&'static str, &str); 7] {
        [
            ("response_type", RESPONSE_TYPE),
            ("scope", SCOPE),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("state", self.pkce.state.as_str()),
            ("code_challenge_method", pkce::CHALLENGE_METHOD),
            ("code_challenge", self.pkce.code_challenge.as_str()),
        ]
    }
}

pub fn build_authorize_url(endpoint: &str, request: &AuthRequest) -> OidcResult<Url> {
    let mut url = Url::parse(endpoint).map_err(|e| OidcError::InvalidEndpoint {
        url: endpoint.to_string(),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut().extend_pairs(request.query_pairs());
    Ok(url)
}

/// Prepare the login redirect: persist state and verifier, return the IdP URL.
pub fn start_login(store: &mut Store) -> OidcResult<Url> {
    let endpoint = setting(store, keys::AUTHORIZATION_ENDPOINT)?.to_string();
    let request = AuthRequest {
        client_id: setting(store, keys::CLIENT_ID)?.to_string(),
        redirect_uri: setting(store, keys::CALLBACK_ENDPOINT)?.to_string(),
        pkce: PkceParams::fixed(),
    };
    info!(
        %endpoint,
        redirect_uri = %request.redirect_uri,
        "Starting login at IdP authorization endpoint"
    );

    let url = build_authorize_url(&endpoint, &request)?;

    store.set(keys::OIDC_STATE, &request.pkce.state);
    store.set(keys::OIDC_CODE_VERIFIER, &request.pkce.code_verifier);
    store.save()?;

    debug!(query = url.query().unwrap_or_default(), "Login request query parameters");
    Ok(url)
}
