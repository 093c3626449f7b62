//! Metadata encoders.
//!
//! Both encodings are plain JSON with a fixed field order, so identical
//! metadata always yields identical bytes (and therefore the same
//! credential id on chain).

use chrono::{DateTime, SecondsFormat, Utc};
use forge_types::{CredentialMetadata, Visibility};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::timestamp::{UNIX_MILLIS_FLOOR, UNIX_SECONDS_FLOOR};
use crate::{validate_metadata, CodecError};

/// Output format for new writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Single-letter keys, rating in tenths. Timestamps are Unix seconds when
    /// that reads back unambiguously, RFC 3339 text otherwise.
    #[default]
    Compact,
    /// Long field names, RFC 3339 timestamps.
    Full,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "full" | "json" => Ok(Self::Full),
            other => Err(CodecError::Validation(format!("unknown encoding: {other}"))),
        }
    }
}

#[derive(Serialize)]
struct CompactWire<'a> {
    t: &'static str,
    n: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    d: &'a str,
    i: &'a str,
    ts: CompactTimestamp,
    v: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    r: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    p: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum CompactTimestamp {
    Seconds(i64),
    Text(String),
}

/// Integers below 10^9 decode as reduced timestamps, and sub-second
/// precision has no integer form, so those instants are written as text.
fn compact_timestamp(ts: DateTime<Utc>) -> CompactTimestamp {
    let secs = ts.timestamp();
    if ts.timestamp_subsec_nanos() == 0
        && (UNIX_SECONDS_FLOOR..UNIX_MILLIS_FLOOR).contains(&secs)
    {
        CompactTimestamp::Seconds(secs)
    } else {
        CompactTimestamp::Text(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

#[derive(Serialize)]
struct FullWire<'a> {
    credential_type: &'static str,
    name: &'a str,
    description: &'a str,
    issuer: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    rating: Option<f64>,
    timestamp: String,
    visibility: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    proof_hash: Option<&'a str>,
}

fn visibility_flag(visibility: Visibility) -> u8 {
    match visibility {
        Visibility::Public => 1,
        Visibility::Private => 0,
    }
}

/// Serialize validated metadata without any size check.
pub fn encode_metadata(
    metadata: &CredentialMetadata,
    encoding: Encoding,
) -> Result<Vec<u8>, CodecError> {
    validate_metadata(metadata)?;
    let result = match encoding {
        Encoding::Compact => serde_json::to_vec(&CompactWire {
            t: metadata.credential_type.code(),
            n: &metadata.name,
            d: &metadata.description,
            i: &metadata.issuer,
            ts: compact_timestamp(metadata.timestamp),
            v: visibility_flag(metadata.visibility),
            r: metadata.rating.map(|r| (r * 10.0).round() as u8),
            p: metadata.proof_hash.as_deref(),
        }),
        Encoding::Full => serde_json::to_vec(&FullWire {
            credential_type: metadata.credential_type.as_str(),
            name: &metadata.name,
            description: &metadata.description,
            issuer: &metadata.issuer,
            rating: metadata.rating,
            timestamp: metadata
                .timestamp
                .to_rfc3339_opts(SecondsFormat::AutoSi, true),
            visibility: metadata.visibility.as_str(),
            proof_hash: metadata.proof_hash.as_deref(),
        }),
    };
    result.map_err(|e| CodecError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use forge_types::CredentialType;

    fn review() -> CredentialMetadata {
        CredentialMetadata {
            credential_type: CredentialType::Review,
            name: "Logo design".into(),
            description: String::new(),
            issuer: "Acme".into(),
            rating: Some(4.5),
            timestamp: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            visibility: Visibility::Private,
            proof_hash: None,
        }
    }

    #[test]
    fn compact_layout() {
        let bytes = encode_metadata(&review(), Encoding::Compact).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"t":"r","n":"Logo design","i":"Acme","ts":1706745600,"v":0,"r":45}"#
        );
    }

    #[test]
    fn full_layout() {
        let bytes = encode_metadata(&review(), Encoding::Full).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            concat!(
                r#"{"credential_type":"review","name":"Logo design","description":"","#,
                r#""issuer":"Acme","rating":4.5,"timestamp":"2024-02-01T00:00:00Z","#,
                r#""visibility":"private"}"#
            )
        );
    }

    #[test]
    fn early_timestamps_are_written_as_text() {
        let mut meta = review();
        meta.timestamp = Utc.with_ymd_and_hms(1999, 6, 1, 0, 0, 0).unwrap();
        let text = String::from_utf8(encode_metadata(&meta, Encoding::Compact).unwrap()).unwrap();
        assert!(text.contains(r#""ts":"1999-06-01T00:00:00Z""#), "{text}");
    }

    #[test]
    fn sub_second_timestamps_are_written_as_text() {
        let mut meta = review();
        meta.timestamp = Utc.timestamp_opt(1_717_243_200, 250_000_000).unwrap();
        let text = String::from_utf8(encode_metadata(&meta, Encoding::Compact).unwrap()).unwrap();
        assert!(text.contains(r#""ts":"2024-06-01T12:00:00.250Z""#), "{text}");
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = encode_metadata(&review(), Encoding::Compact).unwrap();
        let b = encode_metadata(&review(), Encoding::Compact).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_metadata_is_not_encoded() {
        let mut meta = review();
        meta.rating = Some(7.0);
        assert!(matches!(
            encode_metadata(&meta, Encoding::Full),
            Err(CodecError::Validation(_))
        ));
    }

    #[test]
    fn encoding_names_parse() {
        assert_eq!("COMPACT".parse::<Encoding>().unwrap(), Encoding::Compact);
        assert_eq!("full".parse::<Encoding>().unwrap(), Encoding::Full);
        assert!("pipe".parse::<Encoding>().is_err());
    }
}
