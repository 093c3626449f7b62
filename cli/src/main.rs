//! forge: command-line access to FreelanceForge credentials.

mod offline;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use forge_client::{ClientMetrics, ForgeClient};
use forge_rpc::WsTransport;
use forge_types::{AccountId, CredentialId, NetworkProfile};
use forge_utils::LogFormat;
use serde::Serialize;
use tracing::info;

use crate::settings::Overrides;

#[derive(Parser)]
#[command(name = "forge", version, about = "FreelanceForge credential client")]
struct Cli {
    /// Path to a TOML configuration file. `FORGE_*` environment variables
    /// and the flags below override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Endpoint profile: "local" or "paseo".
    #[arg(long, global = true)]
    network: Option<NetworkProfile>,

    /// Endpoints to try, in order (comma-separated or repeated). Replaces the
    /// selected profile's list.
    #[arg(long = "endpoint", global = true, value_delimiter = ',')]
    endpoints: Vec<String>,

    /// Byte ceiling for encoded metadata (at most 4096).
    #[arg(long, global = true)]
    metadata_limit: Option<usize>,

    /// Log level or filter directive, e.g. "debug" or "forge_client=trace".
    #[arg(long, global = true, default_value = "warn", env = "FORGE_LOG_LEVEL")]
    log_level: String,

    /// Log output: "human" or "json". Logs always go to stderr.
    #[arg(long, global = true, default_value = "human", env = "FORGE_LOG_FORMAT")]
    log_format: LogFormat,

    /// Print Prometheus metrics to stderr when the command finishes.
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the node's chain, version and runtime.
    Info,
    /// List every credential an account owns, newest first.
    List { account: String },
    /// Fetch one credential by its 0x-prefixed id.
    Get { id: String },
    /// Export an account's public credentials as a portfolio document.
    Export {
        account: String,
        /// Write to this file instead of stdout.
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Decode stored metadata given as 0x-hex or as raw text.
    Decode { payload: String },
    /// Validate a JSON credential draft and show its encoded form.
    Encode { draft: PathBuf },
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            network: self.network,
            endpoints: self.endpoints.clone(),
            metadata_limit: self.metadata_limit,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    forge_utils::init_logging(cli.log_format, &cli.log_level)?;

    let config = settings::load(
        cli.config.as_deref(),
        |key| std::env::var(key).ok(),
        &cli.overrides(),
    )?;

    // Nothing connects until a command reads from the chain.
    let transport = WsTransport::new(config.pallet_index, config.ss58_prefix);
    let metrics = Arc::new(ClientMetrics::new());
    let client = ForgeClient::with_metrics(transport, config, Arc::clone(&metrics))?;

    let result = execute(&client, cli.command).await;
    client.disconnect().await;
    if cli.metrics {
        eprint!("{}", metrics.encode_text());
    }
    result
}

async fn execute(client: &ForgeClient<WsTransport>, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Info => print_json(&client.chain_info().await?),
        Command::List { account } => print_json(&client.list(&AccountId::new(account)).await?),
        Command::Get { id } => {
            let id = CredentialId::from_hex(&id).context("invalid credential id")?;
            match client.get(&id).await? {
                Some(record) => print_json(&record),
                None => bail!("credential {id} not found"),
            }
        }
        Command::Export { account, out } => {
            let portfolio = client.export_portfolio(&AccountId::new(account)).await?;
            match out {
                Some(path) => {
                    std::fs::write(&path, portfolio.to_json_pretty()?)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(
                        path = %path.display(),
                        credentials = portfolio.total(),
                        "portfolio written"
                    );
                    Ok(())
                }
                None => print_json(&portfolio),
            }
        }
        Command::Decode { payload } => print_json(&offline::decode(&payload)?),
        Command::Encode { draft } => {
            let json = std::fs::read_to_string(&draft)
                .with_context(|| format!("reading {}", draft.display()))?;
            print_json(&offline::encode(&client.config().codec(), &json)?)
        }
    }
}
