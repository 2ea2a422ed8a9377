//! Demo of the OAuth2/OIDC authorization code flow with PKCE.
//!
//! Loads runtime configuration, sends the user to an identity provider,
//! exchanges the returned code for tokens, keeps them in local storage and
//! calls a bearer-protected API with the access token.

/// The current version, sourced from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod commands;
pub mod config;
pub mod jwt;
pub mod logging;
pub mod oidc;
pub mod pkce;
pub mod render;
pub mod router;
pub mod store;
pub mod webui;
