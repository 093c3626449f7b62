//! Configuration layering: file, then `FORGE_*` environment, then flags.

use std::path::Path;

use anyhow::Context;
use forge_client::ClientConfig;
use forge_types::NetworkProfile;
use tracing::info;

/// Values given on the command line; unset fields leave the config alone.
#[derive(Debug, Default)]
pub struct Overrides {
    pub network: Option<NetworkProfile>,
    pub endpoints: Vec<String>,
    pub metadata_limit: Option<usize>,
}

pub fn load<F>(path: Option<&Path>, env: F, overrides: &Overrides) -> anyhow::Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let config = ClientConfig::from_toml_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            info!(path = %path.display(), "loaded config");
            config
        }
        None => ClientConfig::default(),
    };
    config.apply_env(env).context("reading FORGE_* environment")?;

    if let Some(network) = overrides.network {
        config.network = network;
    }
    if !overrides.endpoints.is_empty() {
        let endpoints = overrides.endpoints.clone();
        match config.network {
            NetworkProfile::Local => config.endpoints.local = endpoints,
            NetworkProfile::Paseo => config.endpoints.paseo = endpoints,
        }
    }
    if let Some(limit) = overrides.metadata_limit {
        config.metadata_limit = limit;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}
