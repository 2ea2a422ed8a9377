//! The authorization code flow: initiation, callback exchange, and the
//! bearer-authenticated calls made with the resulting access token.

pub mod api;
pub mod authorize;
pub mod callback;

pub use api::{call_protected, logout, reset};
pub use authorize::{build_authorize_url, start_login, AuthRequest};
pub use callback::{exchange_code, extract_code, handle_callback, persist_tokens, TokenResponse};

#[derive(Debug, thiserror::Error)]
pub enum OidcError {
    #[error("missing '{0}' value in storage")]
    MissingSetting(&'static str),

    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("token endpoint returned {status}: {body}")]
    TokenEndpoint {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type OidcResult<T> = Result<T, OidcError>;

pub(crate) fn setting<'a>(
    store: &'a crate::store::Store,
    key: &'static str,
) -> OidcResult<&'a str> {
    store.get(key).ok_or(OidcError::MissingSetting(key))
}
