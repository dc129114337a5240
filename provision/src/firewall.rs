//! Cluster firewall lifecycle — idempotent create and delete
//!
//! Maps cluster settings to a fixed ingress rule set and drives the hcloud
//! firewall endpoints. Existence is decided purely client-side by matching
//! firewall names against the cluster name; an existing firewall is never
//! reconciled against the desired rule set.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use k3forge_hcloud::{Api, ApiError};

/// Source ranges for rules open to the whole internet
const ANYWHERE: [&str; 2] = ["0.0.0.0/0", "::/0"];

/// The cluster's private network range; node-to-node traffic stays open here
const PRIVATE_NETWORK: &str = "10.0.0.0/16";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[allow(dead_code)]
pub enum Direction {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
}

/// A single ingress rule in the creation payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirewallRule {
    pub description: String,
    pub direction: Direction,
    pub protocol: Protocol,
    /// "any", a numeric port, or absent for ICMP
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    pub source_ips: Vec<String>,
    pub destination_ips: Vec<String>,
}

/// Firewall creation payload; `name` doubles as the uniqueness key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirewallSpec {
    pub name: String,
    pub rules: Vec<FirewallRule>,
}

impl FirewallSpec {
    /// Build the fixed cluster rule set.
    ///
    /// `networks` are the trusted source ranges for SSH and general TCP.
    /// Without high availability the control-plane port 6443 is opened to the
    /// world; in HA topologies a load balancer fronts the API instead.
    pub fn for_cluster(name: &str, high_availability: bool, networks: &[String]) -> Self {
        let mut rules = vec![
            FirewallRule {
                description: "Allow port 22 (SSH)".to_string(),
                direction: Direction::In,
                protocol: Protocol::Tcp,
                port: Some("22".to_string()),
                source_ips: networks.to_vec(),
                destination_ips: Vec::new(),
            },
            FirewallRule {
                description: "Allow all other TCP".to_string(),
                direction: Direction::In,
                protocol: Protocol::Tcp,
                port: Some("any".to_string()),
                source_ips: networks.to_vec(),
                destination_ips: Vec::new(),
            },
            FirewallRule {
                description: "Allow ICMP (ping)".to_string(),
                direction: Direction::In,
                protocol: Protocol::Icmp,
                port: None,
                source_ips: ANYWHERE.map(str::to_string).to_vec(),
                destination_ips: Vec::new(),
            },
            FirewallRule {
                description: "Allow all TCP traffic between nodes on the private network"
                    .to_string(),
                direction: Direction::In,
                protocol: Protocol::Tcp,
                port: Some("any".to_string()),
                source_ips: vec![PRIVATE_NETWORK.to_string()],
                destination_ips: Vec::new(),
            },
            FirewallRule {
                description: "Allow all UDP traffic between nodes on the private network"
                    .to_string(),
                direction: Direction::In,
                protocol: Protocol::Udp,
                port: Some("any".to_string()),
                source_ips: vec![PRIVATE_NETWORK.to_string()],
                destination_ips: Vec::new(),
            },
        ];

        if !high_availability {
            rules.push(FirewallRule {
                description: "Allow port 6443 (Kubernetes API server)".to_string(),
                direction: Direction::In,
                protocol: Protocol::Tcp,
                port: Some("6443".to_string()),
                source_ips: ANYWHERE.map(str::to_string).to_vec(),
                destination_ips: Vec::new(),
            });
        }

        Self {
            name: name.to_string(),
            rules,
        }
    }
}

/// A firewall as listed by the provider; only the fields read here are decoded
#[derive(Debug, Clone, Deserialize)]
pub struct Firewall {
    pub id: u64,
    pub name: String,
}

/// A compute node still associated with the firewall
#[derive(Debug, Clone, Copy)]
pub struct Server {
    pub id: u64,
}

#[derive(Debug, Deserialize)]
struct FirewallsPage {
    firewalls: Vec<Firewall>,
    #[serde(default)]
    meta: Option<PageMeta>,
}

#[derive(Debug, Deserialize)]
struct PageMeta {
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    next_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CreateFirewallResponse {
    firewall: CreatedFirewall,
}

#[derive(Debug, Deserialize)]
struct CreatedFirewall {
    id: u64,
}

#[derive(Debug, Serialize)]
struct DetachAction {
    remove_from: Vec<DetachTarget>,
}

#[derive(Debug, Serialize)]
struct DetachTarget {
    server: ServerRef,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize)]
struct ServerRef {
    id: u64,
}

impl DetachAction {
    fn for_server(id: u64) -> Self {
        Self {
            remove_from: vec![DetachTarget {
                server: ServerRef { id },
                kind: "server".to_string(),
            }],
        }
    }
}

/// Manages the single firewall named after the cluster
pub struct FirewallManager<'a, C> {
    client: &'a C,
    cluster_name: String,
}

impl<'a, C: Api> FirewallManager<'a, C> {
    pub fn new(client: &'a C, cluster_name: impl Into<String>) -> Self {
        Self {
            client,
            cluster_name: cluster_name.into(),
        }
    }

    /// Ensure the cluster firewall exists and return its id.
    ///
    /// An existing firewall short-circuits without touching its rules.
    pub async fn create(
        &self,
        high_availability: bool,
        networks: &[String],
    ) -> Result<u64, ApiError> {
        if let Some(firewall) = self.find_existing().await? {
            info!("Firewall already exists, skipping.");
            return Ok(firewall.id);
        }

        info!("Creating firewall...");
        let spec = FirewallSpec::for_cluster(&self.cluster_name, high_availability, networks);
        let response: CreateFirewallResponse = self.client.post("/firewalls", &spec).await?;
        info!("...firewall created.");

        Ok(response.firewall.id)
    }

    /// Detach `servers` from the cluster firewall, then delete it.
    ///
    /// Detaches run sequentially in input order; a failure aborts the
    /// remaining detaches and the final delete. An absent firewall is a
    /// no-op, not an error.
    pub async fn delete(&self, servers: &[Server]) -> Result<(), ApiError> {
        let Some(firewall) = self.find_existing().await? else {
            info!("Firewall no longer exists, skipping.");
            return Ok(());
        };

        info!("Deleting firewall...");
        let detach_path = format!("/firewalls/{}/actions/remove_from_resources", firewall.id);
        for server in servers {
            debug!("Detaching server {}", server.id);
            let _: serde_json::Value = self
                .client
                .post(&detach_path, &DetachAction::for_server(server.id))
                .await?;
        }

        self.client.delete("/firewalls", firewall.id).await?;
        info!("...firewall deleted.");

        Ok(())
    }

    /// First firewall whose name equals the cluster name, across all pages
    async fn find_existing(&self) -> Result<Option<Firewall>, ApiError> {
        let mut page = 1u32;
        loop {
            let response: FirewallsPage =
                self.client.get(&format!("/firewalls?page={page}")).await?;

            if let Some(firewall) = response
                .firewalls
                .into_iter()
                .find(|firewall| firewall.name == self.cluster_name)
            {
                return Ok(Some(firewall));
            }

            match response
                .meta
                .and_then(|meta| meta.pagination)
                .and_then(|pagination| pagination.next_page)
            {
                Some(next) => page = next,
                None => return Ok(None),
            }
        }
    }
}
