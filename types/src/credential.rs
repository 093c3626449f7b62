//! The credential data model.
//!
//! - [`CredentialMetadata`]: the validated, chain-independent content of a
//!   credential (what gets encoded into the on-chain byte budget).
//! - [`CredentialRecord`]: metadata plus the chain-assigned id and owner.
//! - [`CredentialDraft`]: loosely typed user input, validated by the codec
//!   before anything is encoded.
//! - [`CredentialUpdate`]: the fields that may change after minting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{AccountId, CredentialId, TypesError};

/// Kind of credential. Fixed at mint time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialType {
    Skill,
    Review,
    Payment,
    Certification,
}

impl CredentialType {
    pub const ALL: [CredentialType; 4] = [
        CredentialType::Skill,
        CredentialType::Review,
        CredentialType::Payment,
        CredentialType::Certification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skill => "skill",
            Self::Review => "review",
            Self::Payment => "payment",
            Self::Certification => "certification",
        }
    }

    /// Single-letter code used by the compact encodings.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Skill => "s",
            Self::Review => "r",
            Self::Payment => "p",
            Self::Certification => "c",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialType {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TypesError::UnknownCredentialType(s.to_string()))
    }
}

/// Whether a credential is shown in exported portfolios.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Self::Public)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => Err(TypesError::UnknownVisibility(other.to_string())),
        }
    }
}

/// Validated credential content, independent of where it is stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CredentialMetadata {
    pub credential_type: CredentialType,
    pub name: String,
    pub description: String,
    pub issuer: String,
    /// Star rating in `[0, 5]`; only meaningful for reviews.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub visibility: Visibility,
    /// Content hash of an off-chain proof document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_hash: Option<String>,
}

/// A credential as read back from the chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id: CredentialId,
    pub owner: AccountId,
    #[serde(flatten)]
    pub metadata: CredentialMetadata,
}

impl CredentialRecord {
    pub fn new(id: CredentialId, owner: AccountId, metadata: CredentialMetadata) -> Self {
        Self {
            id,
            owner,
            metadata,
        }
    }
}

/// Unvalidated credential input, as a form or an import file supplies it.
///
/// Every field is optional so that a missing value can be reported as a
/// validation failure instead of a deserialization error.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialDraft {
    #[serde(alias = "type")]
    pub credential_type: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub issuer: Option<String>,
    pub rating: Option<f64>,
    pub timestamp: Option<String>,
    pub visibility: Option<String>,
    pub proof_hash: Option<String>,
}

impl From<&CredentialMetadata> for CredentialDraft {
    fn from(meta: &CredentialMetadata) -> Self {
        Self {
            credential_type: Some(meta.credential_type.as_str().to_string()),
            name: Some(meta.name.clone()),
            description: Some(meta.description.clone()),
            issuer: Some(meta.issuer.clone()),
            rating: meta.rating,
            timestamp: Some(meta.timestamp.to_rfc3339()),
            visibility: Some(meta.visibility.as_str().to_string()),
            proof_hash: meta.proof_hash.clone(),
        }
    }
}

/// Post-mint changes. Type, name, issuer and the rest are immutable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialUpdate {
    pub visibility: Option<Visibility>,
    pub proof_hash: Option<String>,
}

impl CredentialUpdate {
    pub fn is_empty(&self) -> bool {
        self.visibility.is_none() && self.proof_hash.is_none()
    }

    /// Merge the supplied fields into `metadata`, leaving the rest untouched.
    pub fn apply_to(&self, metadata: &mut CredentialMetadata) {
        if let Some(visibility) = self.visibility {
            metadata.visibility = visibility;
        }
        if let Some(proof_hash) = &self.proof_hash {
            metadata.proof_hash = Some(proof_hash.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> CredentialMetadata {
        CredentialMetadata {
            credential_type: CredentialType::Review,
            name: "Great client".into(),
            description: "Delivered on time".into(),
            issuer: "Upwork".into(),
            rating: Some(4.5),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            visibility: Visibility::Public,
            proof_hash: None,
        }
    }

    #[test]
    fn type_codes_round_trip() {
        for t in CredentialType::ALL {
            assert_eq!(CredentialType::from_code(t.code()), Some(t));
            assert_eq!(t.as_str().parse::<CredentialType>().unwrap(), t);
        }
        assert_eq!(CredentialType::from_code("x"), None);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = "badge".parse::<CredentialType>().unwrap_err();
        assert_eq!(err, TypesError::UnknownCredentialType("badge".into()));
    }

    #[test]
    fn visibility_parsing_is_strict() {
        assert_eq!("private".parse::<Visibility>().unwrap(), Visibility::Private);
        assert!("hidden".parse::<Visibility>().is_err());
        assert_eq!(Visibility::default(), Visibility::Public);
    }

    #[test]
    fn update_merges_only_supplied_fields() {
        let mut meta = sample();
        let update = CredentialUpdate {
            visibility: Some(Visibility::Private),
            proof_hash: None,
        };
        update.apply_to(&mut meta);
        assert_eq!(meta.visibility, Visibility::Private);
        assert_eq!(meta.proof_hash, None);
        assert_eq!(meta.name, "Great client");

        let update = CredentialUpdate {
            visibility: None,
            proof_hash: Some("0xabc".into()),
        };
        update.apply_to(&mut meta);
        assert_eq!(meta.visibility, Visibility::Private);
        assert_eq!(meta.proof_hash.as_deref(), Some("0xabc"));
    }

    #[test]
    fn empty_update() {
        assert!(CredentialUpdate::default().is_empty());
    }

    #[test]
    fn draft_accepts_type_alias() {
        let draft: CredentialDraft =
            serde_json::from_str(r#"{"type":"skill","name":"Rust"}"#).unwrap();
        assert_eq!(draft.credential_type.as_deref(), Some("skill"));
        assert_eq!(draft.name.as_deref(), Some("Rust"));
        assert_eq!(draft.issuer, None);
    }

    #[test]
    fn draft_from_metadata_keeps_every_field() {
        let meta = sample();
        let draft = CredentialDraft::from(&meta);
        assert_eq!(draft.credential_type.as_deref(), Some("review"));
        assert_eq!(draft.rating, Some(4.5));
        assert_eq!(draft.timestamp.as_deref(), Some("2024-03-01T12:00:00+00:00"));
    }

    #[test]
    fn record_serializes_flat() {
        let record = CredentialRecord::new(
            CredentialId::new([2u8; 32]),
            AccountId::from("5Owner"),
            sample(),
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["owner"], "5Owner");
        assert_eq!(value["credential_type"], "review");
        assert_eq!(value["visibility"], "public");
        assert!(value.get("proof_hash").is_none());
    }
}
