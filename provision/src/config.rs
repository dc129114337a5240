//! Cluster configuration loading and parsing

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Cluster settings consumed by the provisioner
#[derive(Debug, Deserialize)]
pub struct ClusterConfig {
    /// Names the cluster and, through it, the firewall
    pub cluster_name: String,
    /// Multiple control-plane nodes behind a load balancer
    #[serde(default)]
    pub high_availability: bool,
    /// Trusted source ranges for SSH and general TCP
    #[serde(default = "default_allowed_networks")]
    pub allowed_networks: Vec<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

fn default_allowed_networks() -> Vec<String> {
    vec!["0.0.0.0/0".to_string(), "::/0".to_string()]
}

fn default_api_base_url() -> String {
    "https://api.hetzner.cloud/v1".to_string()
}

impl ClusterConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read cluster config: {}", path.display()))?;

        let config: ClusterConfig =
            toml::from_str(&contents).context("Failed to parse cluster config")?;
        config.validate()?;

        Ok(config)
    }

    /// Reject configurations the provisioner cannot act on.
    ///
    /// CIDR syntax is not checked; the provider validates source ranges.
    pub fn validate(&self) -> Result<()> {
        if self.cluster_name.is_empty() {
            bail!("cluster_name must not be empty");
        }
        if self.allowed_networks.is_empty() {
            bail!("allowed_networks must list at least one source range");
        }
        Ok(())
    }
}
