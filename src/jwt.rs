//! Display-only JWT decoding. Signatures are never verified.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const DATE_CLAIMS: [&str; 2] = ["iat", "exp"];

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("token has no {0} segment")]
    MissingSegment(&'static str),

    #[error("{segment} segment is not base64url: {source}")]
    Base64 {
        segment: &'static str,
        source: base64::DecodeError,
    },

    #[error("{segment} segment is not JSON: {source}")]
    Json {
        segment: &'static str,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedJwt {
    pub header: Value,
    pub body: Value,
}

impl DecodedJwt {
    /// JSON rendering with 4-space indentation.
    pub fn to_pretty(&self) -> String {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        if self.serialize(&mut ser).is_err() {
            return String::new();
        }
        String::from_utf8(out).unwrap_or_default()
    }
}

pub fn decode_jwt(token: &str) -> Result<DecodedJwt, JwtError> {
    let mut segments = token.trim().split('.');
    let header = decode_segment(segments.next(), "header")?;
    let mut body = decode_segment(segments.next(), "body")?;

    if let Value::Object(claims) = &mut body {
        for claim in DATE_CLAIMS {
            if let Some(rendered) = claims.get(claim).and_then(render_timestamp) {
                claims.insert(claim.to_string(), Value::String(rendered));
            }
        }
    }

    Ok(DecodedJwt { header, body })
}

fn decode_segment(segment: Option<&str>, name: &'static str) -> Result<Value, JwtError> {
    let segment = segment
        .filter(|s| !s.is_empty())
        .ok_or(JwtError::MissingSegment(name))?;
    let bytes = URL_SAFE_LENIENT
        .decode(segment)
        .map_err(|source| JwtError::Base64 {
            segment: name,
            source,
        })?;
    serde_json::from_slice(&bytes).map_err(|source| JwtError::Json {
        segment: name,
        source,
    })
}

/// Seconds since the epoch as a UTC date string. Zero and non-numeric
/// values are left as they are.
fn render_timestamp(value: &Value) -> Option<String> {
    let secs = value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.trunc() as i64))?;
    if secs == 0 {
        return None;
    }
    let date: DateTime<Utc> = DateTime::from_timestamp(secs, 0)?;
    Some(date.format("%a %b %d %Y %H:%M:%S GMT%z").to_string())
}
