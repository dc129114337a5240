//! k3forge provisioner — cluster firewall lifecycle on Hetzner Cloud
//!
//! Ensures a firewall carrying the cluster rule set exists (idempotent
//! create) and tears it down after detaching the remaining servers
//! (idempotent delete).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use k3forge_hcloud::HetznerClient;

mod config;
mod firewall;

use config::ClusterConfig;
use firewall::{FirewallManager, Server};

#[derive(Parser)]
#[command(
    name = "k3forge-provision",
    about = "Cluster firewall provisioning for Hetzner Cloud"
)]
struct Cli {
    /// Path to the cluster configuration file
    #[arg(short, long, default_value = "cluster.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ensure the cluster firewall exists
    CreateFirewall,
    /// Detach servers from the cluster firewall and delete it
    DeleteFirewall {
        /// Id of a server still attached to the firewall (repeatable)
        #[arg(long = "server-id")]
        server_ids: Vec<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .compact()
        .init();

    let cli = Cli::parse();
    let config = ClusterConfig::load(&cli.config)?;

    // Credentials come from the environment, never from config files
    let token = std::env::var("HCLOUD_TOKEN").unwrap_or_default();
    if token.is_empty() {
        bail!("HCLOUD_TOKEN is not set");
    }

    let client = HetznerClient::with_base_url(token, config.api_base_url.clone());
    let manager = FirewallManager::new(&client, config.cluster_name.clone());

    match cli.command {
        Command::CreateFirewall => {
            info!("Provisioning firewall for cluster '{}'", config.cluster_name);
            let id = manager
                .create(config.high_availability, &config.allowed_networks)
                .await
                .context("Firewall creation failed")?;
            info!("Firewall id: {id}");
        }
        Command::DeleteFirewall { server_ids } => {
            info!("Tearing down firewall for cluster '{}'", config.cluster_name);
            let servers: Vec<Server> = server_ids.into_iter().map(|id| Server { id }).collect();
            manager
                .delete(&servers)
                .await
                .context("Firewall deletion failed")?;
        }
    }

    Ok(())
}
