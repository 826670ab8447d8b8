use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::docker::{self, DockerClient, ResourceType, VolumeSpec, VolumeSummary};
use crate::format::format_created;
use crate::resource::{Operation, Resource, ResourceKind, ResourceManager};

pub struct Volumes;

pub type VolumeManager = ResourceManager<Volumes>;

impl ResourceKind for Volumes {
    type Item = VolumeSummary;

    const TYPE: ResourceType = ResourceType::Volume;
    const DEFAULT_TTL: Duration = Duration::from_secs(120);

    fn load(client: &dyn DockerClient) -> docker::Result<Vec<VolumeSummary>> {
        client.list_volumes()
    }
}

impl Resource for VolumeSummary {
    fn id(&self) -> &str {
        &self.name
    }

    fn matches_search(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(query)
            || self.driver.to_lowercase().contains(query)
            || self.mountpoint.to_lowercase().contains(query)
    }

    fn matches_filter(&self, key: &str, value: &str) -> bool {
        match (key, value) {
            ("driver", v) => self.driver.to_lowercase().contains(v),
            ("status", "used") => self.in_use,
            ("status", "unused") => !self.in_use,
            ("type", "local") => self.is_local(),
            ("type", "remote") => !self.is_local(),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VolumeCounts {
    pub total: usize,
    pub used: usize,
    pub unused: usize,
}

impl ResourceManager<Volumes> {
    pub fn create(&mut self, spec: VolumeSpec) {
        let target = spec.name.clone();
        self.run_operation(Operation::Create, target, move |c, _| {
            let name = c.create_volume(&spec)?;
            Ok(format!("created volume {name}"))
        });
    }

    pub fn counts(&self) -> VolumeCounts {
        let used = self.count(|v| v.in_use);
        let total = self.resources().len();
        VolumeCounts {
            total,
            used,
            unused: total - used,
        }
    }

    pub fn rows(&self, now: DateTime<Utc>) -> Vec<VolumeRow> {
        self.filtered()
            .iter()
            .map(|v| VolumeRow::new(v, now))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeRow {
    pub name: String,
    pub driver: String,
    pub mountpoint: String,
    pub in_use: bool,
    pub created: String,
}

impl VolumeRow {
    pub fn new(v: &VolumeSummary, now: DateTime<Utc>) -> Self {
        Self {
            name: v.name.clone(),
            driver: v.driver.clone(),
            mountpoint: v.mountpoint.clone(),
            in_use: v.in_use,
            created: format_created(v.created, now),
        }
    }

    pub fn usage(&self) -> &'static str {
        if self.in_use { "in use" } else { "unused" }
    }
}
