//! Metadata decoders.
//!
//! Stored bytes are tried against each [`Format`] in order; the first one
//! that yields a record wins. Decoders are lenient: missing names, issuers
//! and timestamps get placeholders, and an unrecognised type falls back to
//! `skill`. Only bytes that match no format at all are an error.

use chrono::{DateTime, Utc};
use forge_types::{CredentialMetadata, CredentialType, Visibility};
use serde_json::{Map, Value};
use std::fmt;

use crate::timestamp::{normalize_json, normalize_text};
use crate::{CodecError, UNKNOWN_ISSUER, UNNAMED_CREDENTIAL};

const PIPE_FIELDS: usize = 5;

/// A stored metadata layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// `type|name|issuer|reduced_ts|visibility_flag`
    Pipe,
    /// `{"t":..,"n":..,"d":..,"i":..,"ts":..,"v":..,"r":..,"p":..}`
    Compact,
    /// `{"credential_type":..,"name":..,...}`
    Full,
}

impl Format {
    /// Decode attempt order.
    pub const ORDER: [Format; 3] = [Format::Pipe, Format::Compact, Format::Full];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pipe => "pipe",
            Self::Compact => "compact",
            Self::Full => "full",
        }
    }

    fn try_decode(
        &self,
        text: &str,
        json: Option<&Map<String, Value>>,
        now: DateTime<Utc>,
    ) -> Option<CredentialMetadata> {
        match self {
            Self::Pipe => decode_pipe(text, now),
            Self::Compact => json.and_then(|obj| decode_compact(obj, now)),
            Self::Full => json.map(|obj| decode_full(obj, now)),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successfully decoded record and the layout it was stored in.
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
    pub format: Format,
    pub metadata: CredentialMetadata,
}

/// Decode stored metadata bytes, trying every known layout in order.
///
/// `now` stands in for missing or unparseable timestamps.
pub fn decode_metadata(bytes: &[u8], now: DateTime<Utc>) -> Result<Decoded, CodecError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| CodecError::Malformed(format!("not valid UTF-8: {e}")))?;
    let text = text.trim();
    if text.is_empty() {
        return Err(CodecError::Malformed("empty payload".into()));
    }

    let parsed = if text.starts_with('{') {
        serde_json::from_str::<Value>(text).ok()
    } else {
        None
    };
    let json = parsed.as_ref().and_then(Value::as_object);

    Format::ORDER
        .iter()
        .find_map(|format| {
            format
                .try_decode(text, json, now)
                .map(|metadata| Decoded {
                    format: *format,
                    metadata,
                })
        })
        .ok_or_else(|| CodecError::Malformed("unrecognised metadata layout".into()))
}

fn type_from_text(text: &str) -> CredentialType {
    let text = text.trim().to_ascii_lowercase();
    CredentialType::from_code(&text)
        .or_else(|| text.parse().ok())
        .unwrap_or(CredentialType::Skill)
}

fn non_empty_or(text: &str, fallback: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        fallback.to_string()
    } else {
        text.to_string()
    }
}

fn decode_pipe(text: &str, now: DateTime<Utc>) -> Option<CredentialMetadata> {
    if text.starts_with('{') {
        return None;
    }
    let fields: Vec<&str> = text.split('|').collect();
    if fields.len() < PIPE_FIELDS {
        return None;
    }
    let visibility = if fields[4].trim() == "0" {
        Visibility::Private
    } else {
        Visibility::Public
    };
    Some(CredentialMetadata {
        credential_type: type_from_text(fields[0]),
        name: non_empty_or(fields[1], UNNAMED_CREDENTIAL),
        description: String::new(),
        issuer: non_empty_or(fields[2], UNKNOWN_ISSUER),
        rating: None,
        timestamp: normalize_text(fields[3], now),
        visibility,
        proof_hash: None,
    })
}

fn first<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k)).filter(|v| !v.is_null())
}

fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    match first(obj, keys)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    match first(obj, keys)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn rating_in_range(rating: f64) -> Option<f64> {
    (rating.is_finite() && (0.0..=5.0).contains(&rating)).then_some(rating)
}

fn proof_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    text_field(obj, keys)
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
}

fn decode_compact(obj: &Map<String, Value>, now: DateTime<Utc>) -> Option<CredentialMetadata> {
    let is_compact = (obj.contains_key("t") || obj.contains_key("n")) && !obj.contains_key("name");
    if !is_compact {
        return None;
    }

    let private = match obj.get("v") {
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => matches!(s.trim(), "0" | "private"),
        Some(Value::Bool(b)) => !b,
        _ => false,
    };

    Some(CredentialMetadata {
        credential_type: text_field(obj, &["t"])
            .map(|t| type_from_text(&t))
            .unwrap_or(CredentialType::Skill),
        name: non_empty_or(&text_field(obj, &["n"]).unwrap_or_default(), UNNAMED_CREDENTIAL),
        description: text_field(obj, &["d"]).unwrap_or_default(),
        issuer: non_empty_or(&text_field(obj, &["i"]).unwrap_or_default(), UNKNOWN_ISSUER),
        rating: number_field(obj, &["r"]).and_then(|r| rating_in_range(r / 10.0)),
        timestamp: first(obj, &["ts"])
            .map(|v| normalize_json(v, now))
            .unwrap_or(now),
        visibility: if private {
            Visibility::Private
        } else {
            Visibility::Public
        },
        proof_hash: proof_field(obj, &["p"]),
    })
}

fn decode_full(obj: &Map<String, Value>, now: DateTime<Utc>) -> CredentialMetadata {
    let private = match first(obj, &["visibility"]) {
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("private"),
        Some(Value::Bool(b)) => !b,
        _ => false,
    };

    CredentialMetadata {
        credential_type: text_field(obj, &["credential_type", "credentialType", "type"])
            .map(|t| type_from_text(&t))
            .unwrap_or(CredentialType::Skill),
        name: non_empty_or(
            &text_field(obj, &["name"]).unwrap_or_default(),
            UNNAMED_CREDENTIAL,
        ),
        description: text_field(obj, &["description"]).unwrap_or_default(),
        issuer: non_empty_or(
            &text_field(obj, &["issuer"]).unwrap_or_default(),
            UNKNOWN_ISSUER,
        ),
        rating: number_field(obj, &["rating"]).and_then(rating_in_range),
        timestamp: first(obj, &["timestamp"])
            .map(|v| normalize_json(v, now))
            .unwrap_or(now),
        visibility: if private {
            Visibility::Private
        } else {
            Visibility::Public
        },
        proof_hash: proof_field(obj, &["proof_hash", "proofHash"]),
    }
}
