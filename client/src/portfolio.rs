//! Portfolio export: an owner's public credentials as one JSON document.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use forge_types::{AccountId, CredentialRecord, CredentialType};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub owner: AccountId,
    pub generated_at: DateTime<Utc>,
    /// Public credentials per type; every type is present, possibly at zero.
    pub counts: BTreeMap<String, usize>,
    /// Newest first.
    pub credentials: Vec<CredentialRecord>,
}

impl Portfolio {
    /// Keep the public records of `records`, newest first.
    pub fn build(
        owner: AccountId,
        records: Vec<CredentialRecord>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let mut credentials: Vec<_> = records
            .into_iter()
            .filter(|r| r.metadata.visibility.is_public())
            .collect();
        credentials.sort_by(|a, b| b.metadata.timestamp.cmp(&a.metadata.timestamp));

        let mut counts: BTreeMap<String, usize> = CredentialType::ALL
            .iter()
            .map(|t| (t.as_str().to_string(), 0))
            .collect();
        for record in &credentials {
            *counts
                .entry(record.metadata.credential_type.as_str().to_string())
                .or_default() += 1;
        }

        Self {
            owner,
            generated_at,
            counts,
            credentials,
        }
    }

    pub fn total(&self) -> usize {
        self.credentials.len()
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
