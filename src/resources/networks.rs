use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::docker::{self, DockerClient, NetworkSpec, NetworkSummary, ResourceType};
use crate::format::{format_created, short_id};
use crate::resource::{Operation, Resource, ResourceKind, ResourceManager};

pub struct Networks;

pub type NetworkManager = ResourceManager<Networks>;

impl ResourceKind for Networks {
    type Item = NetworkSummary;

    const TYPE: ResourceType = ResourceType::Network;
    const DEFAULT_TTL: Duration = Duration::from_secs(120);

    fn load(client: &dyn DockerClient) -> docker::Result<Vec<NetworkSummary>> {
        client.list_networks()
    }

    fn delete(client: &dyn DockerClient, id: &str) -> docker::Result<()> {
        client.remove(ResourceType::Network, id, false)
    }
}

impl Resource for NetworkSummary {
    fn id(&self) -> &str {
        &self.id
    }

    fn matches_search(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(query)
            || self.driver.to_lowercase().contains(query)
            || self.scope.to_lowercase().contains(query)
            || short_id(&self.id).to_lowercase().contains(query)
    }

    fn matches_filter(&self, key: &str, value: &str) -> bool {
        match key {
            "driver" => self.driver.to_lowercase().contains(value),
            "scope" => self.scope.to_lowercase().contains(value),
            "type" => match value {
                "builtin" => self.is_builtin(),
                "custom" => !self.is_builtin(),
                _ => true,
            },
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkCounts {
    pub total: usize,
    pub builtin: usize,
    pub custom: usize,
}

impl ResourceManager<Networks> {
    pub fn create(&mut self, spec: NetworkSpec) {
        let target = spec.name.clone();
        self.run_operation(Operation::Create, target, move |c, _| {
            let id = c.create_network(&spec)?;
            Ok(format!("created network {} ({})", spec.name, short_id(&id)))
        });
    }

    pub fn connect(&mut self, network: &str, container: &str) {
        let (network, container) = (network.to_string(), container.to_string());
        let target = format!("{container} → {network}");
        self.run_operation(Operation::Connect, target, move |c, _| {
            c.connect_network(&network, &container)?;
            Ok(format!("connected {container} to {network}"))
        });
    }

    pub fn disconnect(&mut self, network: &str, container: &str) {
        let (network, container) = (network.to_string(), container.to_string());
        let target = format!("{container} ↛ {network}");
        self.run_operation(Operation::Disconnect, target, move |c, _| {
            c.disconnect_network(&network, &container)?;
            Ok(format!("disconnected {container} from {network}"))
        });
    }

    pub fn counts(&self) -> NetworkCounts {
        let builtin = self.count(NetworkSummary::is_builtin);
        let total = self.resources().len();
        NetworkCounts {
            total,
            builtin,
            custom: total - builtin,
        }
    }

    /// Number of networks per driver.
    pub fn by_driver(&self) -> BTreeMap<String, usize> {
        let mut map = BTreeMap::new();
        for n in self.resources() {
            *map.entry(n.driver.clone()).or_insert(0) += 1;
        }
        map
    }

    pub fn rows(&self, now: DateTime<Utc>) -> Vec<NetworkRow> {
        self.filtered()
            .iter()
            .map(|n| NetworkRow::new(n, now))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkRow {
    pub id: String,
    pub short_id: String,
    pub name: String,
    pub driver: String,
    pub scope: String,
    pub subnet: String,
    pub containers: usize,
    pub builtin: bool,
    pub created: String,
}

impl NetworkRow {
    pub fn new(n: &NetworkSummary, now: DateTime<Utc>) -> Self {
        Self {
            id: n.id.clone(),
            short_id: short_id(&n.id).to_string(),
            name: n.name.clone(),
            driver: n.driver.clone(),
            scope: n.scope.clone(),
            subnet: if n.subnets.is_empty() {
                "-".to_string()
            } else {
                n.subnets.join(", ")
            },
            containers: n.containers,
            builtin: n.is_builtin(),
            created: format_created(n.created, now),
        }
    }
}
