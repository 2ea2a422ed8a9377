//! PKCE (RFC 7636) parameters for the authorization code flow.
//!
//! The verifier, challenge and state are fixed values. A real client would
//! generate a random verifier of 43 to 128 characters per login.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

pub const CHALLENGE_METHOD: &str = "S256";

pub const STATE: &str = "foobarbaz";

pub const CODE_VERIFIER: &str = "_SqP8qgZiyRIAFiV-_HMmD9NshvB8k_tVQT-fJJPtNPCn4E7zWO6HZFQ-KAavMRF5cOomuMg46aU-tzQEcZIVXIFWhIEUFudYT38ZakMfm14r-L0dEZEc_T2FlHaSRcI";

/// `code_challenge(CODE_VERIFIER)`.
pub const CODE_CHALLENGE: &str = "WfAQIP_WPZCrIfUUbSr7fQhoTEez8cU7gybrmst79u0";

/// S256 transform: `BASE64URL-ENCODE(SHA256(ASCII(code_verifier)))`.
pub fn code_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceParams {
    pub state: String,
    pub code_verifier: String,
    pub code_challenge: String,
}

impl PkceParams {
    pub fn fixed() -> Self {
        Self {
            state: STATE.to_string(),
            code_verifier: CODE_VERIFIER.to_string(),
            code_challenge: CODE_CHALLENGE.to_string(),
        }
    }
}
