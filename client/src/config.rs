//! Client configuration with TOML file and environment support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use forge_metadata::{Encoding, MetadataCodec, CHAIN_METADATA_LIMIT, DEFAULT_METADATA_LIMIT};
use forge_protocol::DEFAULT_PALLET_INDEX;
use forge_types::NetworkProfile;

use crate::retry::RetryPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for a [`ForgeClient`](crate::ForgeClient).
///
/// Can be loaded from a TOML file via [`ClientConfig::from_toml_file`],
/// layered with `FORGE_*` environment variables via
/// [`ClientConfig::apply_env`], or built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Which endpoint profile to connect through.
    #[serde(default)]
    pub network: NetworkProfile,

    /// Ranked endpoint lists per profile.
    #[serde(default)]
    pub endpoints: EndpointConfig,

    /// Bound on the transport-level connect to one endpoint.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Bound on the readiness wait after a successful connect.
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,

    /// Backoff for connection and storage reads.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Byte ceiling for encoded metadata. Never above the chain's 4096.
    #[serde(default = "default_metadata_limit")]
    pub metadata_limit: usize,

    /// Wire layout for new writes.
    #[serde(default)]
    pub metadata_encoding: Encoding,

    /// Runtime index of the credentials pallet.
    #[serde(default = "default_pallet_index")]
    pub pallet_index: u8,

    /// Address format used when rendering owners read from storage.
    #[serde(default = "default_ss58_prefix")]
    pub ss58_prefix: u16,

    /// Pause between submissions in a batch mint.
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_local_endpoints")]
    pub local: Vec<String>,
    #[serde(default = "default_paseo_endpoints")]
    pub paseo: Vec<String>,
}

impl EndpointConfig {
    pub fn for_profile(&self, profile: NetworkProfile) -> &[String] {
        match profile {
            NetworkProfile::Local => &self.local,
            NetworkProfile::Paseo => &self.paseo,
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            local: default_local_endpoints(),
            paseo: default_paseo_endpoints(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

// ── Serde default helpers ──────────────────────────────────────────────

fn profile_endpoints(profile: NetworkProfile) -> Vec<String> {
    profile
        .default_endpoints()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_local_endpoints() -> Vec<String> {
    profile_endpoints(NetworkProfile::Local)
}

fn default_paseo_endpoints() -> Vec<String> {
    profile_endpoints(NetworkProfile::Paseo)
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_ready_timeout_ms() -> u64 {
    10_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    2_000
}

fn default_metadata_limit() -> usize {
    DEFAULT_METADATA_LIMIT
}

fn default_pallet_index() -> u8 {
    DEFAULT_PALLET_INDEX
}

fn default_ss58_prefix() -> u16 {
    forge_crypto::GENERIC_SS58_PREFIX
}

fn default_batch_delay_ms() -> u64 {
    1_000
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay `FORGE_*` variables returned by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(network) = lookup("FORGE_NETWORK") {
            self.network = network
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("FORGE_NETWORK: {e}")))?;
        }
        if let Some(list) = lookup("FORGE_LOCAL_ENDPOINTS") {
            self.endpoints.local = split_endpoints(&list);
        }
        if let Some(list) = lookup("FORGE_PASEO_ENDPOINTS") {
            self.endpoints.paseo = split_endpoints(&list);
        }
        if let Some(v) = lookup("FORGE_CONNECT_TIMEOUT_MS") {
            self.connect_timeout_ms = parse_var("FORGE_CONNECT_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("FORGE_READY_TIMEOUT_MS") {
            self.ready_timeout_ms = parse_var("FORGE_READY_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("FORGE_METADATA_LIMIT") {
            self.metadata_limit = parse_var("FORGE_METADATA_LIMIT", &v)?;
        }
        if let Some(v) = lookup("FORGE_PALLET_INDEX") {
            self.pallet_index = parse_var("FORGE_PALLET_INDEX", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.active_endpoints().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "no endpoints configured for network '{}'",
                self.network
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.metadata_limit == 0 || self.metadata_limit > CHAIN_METADATA_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "metadata_limit must be within 1..={CHAIN_METADATA_LIMIT}, got {}",
                self.metadata_limit
            )));
        }
        Ok(())
    }

    /// Endpoints of the selected profile, in preference order.
    pub fn active_endpoints(&self) -> &[String] {
        self.endpoints.for_profile(self.network)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }

    pub fn codec(&self) -> MetadataCodec {
        MetadataCodec::new(self.metadata_limit, self.metadata_encoding)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            network: NetworkProfile::default(),
            endpoints: EndpointConfig::default(),
            connect_timeout_ms: default_connect_timeout_ms(),
            ready_timeout_ms: default_ready_timeout_ms(),
            retry: RetryConfig::default(),
            metadata_limit: default_metadata_limit(),
            metadata_encoding: Encoding::default(),
            pallet_index: default_pallet_index(),
            ss58_prefix: default_ss58_prefix(),
            batch_delay_ms: default_batch_delay_ms(),
        }
    }
}

fn split_endpoints(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::Invalid(format!("{key}={value}: {e}")))
}
