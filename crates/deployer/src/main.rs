//! Contract Deployer
//!
//! Deploys a compiled contract artifact and prints its address record.

mod migration;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use oasisx_core::api::{ContractArtifact, RpcClient};
use oasisx_core::config::{Config, MigrationParameters};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::migration::Migration;

#[derive(Debug, Parser)]
#[command(name = "deploy", about = "Deploy an OasisX contract artifact")]
struct Args {
    /// Network name; `rinkeby` and `mainnet` select their own parameters.
    #[arg(long)]
    network: Option<String>,

    /// Compiled artifact JSON.
    #[arg(long, default_value = "build/contracts/Crowdfunding.json")]
    artifact: PathBuf,

    /// Migration parameters file.
    #[arg(long, default_value = "migration-parameters.toml")]
    params: PathBuf,

    /// Node endpoint, overriding RPC_URL.
    #[arg(long)]
    rpc_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deployer=info,oasisx_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(url) = args.rpc_url {
        config.rpc.url = url;
    }
    let network = args.network.unwrap_or(config.network);

    info!(network = %network, rpc_url = %config.rpc.url, "Starting deployment");

    let params = MigrationParameters::load(&args.params)
        .with_context(|| format!("Loading {}", args.params.display()))?;
    let artifact = ContractArtifact::load(&args.artifact)
        .with_context(|| format!("Loading {}", args.artifact.display()))?;

    let client = RpcClient::from_config(&config.rpc)?;
    let migration = Migration::new(&client, &network, &params)?;

    if let Some(record) = migration.run(&artifact).await? {
        println!("{record}");
    }

    Ok(())
}
