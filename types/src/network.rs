//! Network profiles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Named set of chain endpoints the client may connect to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkProfile {
    /// A development node on this machine.
    #[default]
    Local,
    /// The public Paseo test network.
    Paseo,
}

impl NetworkProfile {
    /// Built-in endpoints, in preference order.
    pub fn default_endpoints(&self) -> &'static [&'static str] {
        match self {
            Self::Local => &["ws://127.0.0.1:9944", "ws://localhost:9944"],
            Self::Paseo => &[
                "wss://paseo.rpc.amforc.com",
                "wss://paseo-rpc.dwellir.com",
                "wss://rpc.ibp.network/paseo",
            ],
        }
    }

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Paseo => "paseo",
        }
    }
}

impl fmt::Display for NetworkProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkProfile {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "dev" => Ok(Self::Local),
            "paseo" | "testnet" => Ok(Self::Paseo),
            other => Err(TypesError::UnknownNetwork(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("LOCAL".parse::<NetworkProfile>().unwrap(), NetworkProfile::Local);
        assert_eq!("testnet".parse::<NetworkProfile>().unwrap(), NetworkProfile::Paseo);
        assert!("mainnet".parse::<NetworkProfile>().is_err());
    }

    #[test]
    fn every_profile_has_endpoints() {
        for profile in [NetworkProfile::Local, NetworkProfile::Paseo] {
            assert!(!profile.default_endpoints().is_empty());
        }
    }
}
