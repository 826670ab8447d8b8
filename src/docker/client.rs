use std::collections::BTreeMap;

use tracing::warn;

use super::error::Result;
use super::types::{
    CancelToken, ContainerStats, ContainerSummary, DiskUsageEntry, ImageSummary, NetworkSpec,
    NetworkSummary, PruneReport, ResourceType, SystemInfo, VolumeSpec, VolumeSummary,
};

/// Everything the managers need from the Docker daemon.
///
/// [`DockerCli`](super::DockerCli) is the production implementation; tests
/// substitute an in-memory fake. Implementations must be shareable across
/// the worker threads that run refreshes and operations.
pub trait DockerClient: Send + Sync {
    /// Return the daemon's server version, failing if it is unreachable.
    fn ping(&self) -> Result<String>;

    fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>>;
    fn list_images(&self) -> Result<Vec<ImageSummary>>;
    fn list_networks(&self) -> Result<Vec<NetworkSummary>>;
    fn list_volumes(&self) -> Result<Vec<VolumeSummary>>;

    fn start_container(&self, id: &str) -> Result<()>;
    fn stop_container(&self, id: &str) -> Result<()>;
    fn restart_container(&self, id: &str) -> Result<()>;
    fn container_logs(&self, id: &str, tail: usize) -> Result<String>;
    fn container_stats(&self, id: &str) -> Result<ContainerStats>;

    /// Pull an image, reporting each progress line to `on_line`.
    fn pull_image(
        &self,
        name: &str,
        cancel: &CancelToken,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<()>;
    fn tag_image(&self, id: &str, repository: &str, tag: &str) -> Result<()>;

    /// Create a network and return its id.
    fn create_network(&self, spec: &NetworkSpec) -> Result<String>;
    fn connect_network(&self, network: &str, container: &str) -> Result<()>;
    fn disconnect_network(&self, network: &str, container: &str) -> Result<()>;

    /// Create a volume and return its name.
    fn create_volume(&self, spec: &VolumeSpec) -> Result<String>;

    /// Remove one resource. `force` is ignored for networks.
    fn remove(&self, kind: ResourceType, id: &str, force: bool) -> Result<()>;

    /// Delete every unused resource of `kind`.
    fn prune(&self, kind: ResourceType) -> Result<PruneReport>;

    fn system_info(&self) -> Result<SystemInfo>;
    fn disk_usage(&self) -> Result<Vec<DiskUsageEntry>>;

    /// Prune containers, images, networks and volumes in that order, summing
    /// the reclaimed space. Stops at the first failure.
    fn prune_system(&self) -> Result<PruneReport> {
        let mut total = PruneReport::default();
        for kind in ResourceType::ALL {
            total.merge(self.prune(kind)?);
        }
        Ok(total)
    }

    /// Remove several resources, continuing past individual failures.
    fn remove_many(&self, kind: ResourceType, ids: &[String], force: bool) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for id in ids {
            match self.remove(kind, id, force) {
                Ok(()) => outcome.succeeded.push(id.clone()),
                Err(e) => {
                    warn!(%kind, %id, error = %e, "batch removal failed for one item");
                    outcome.failed.insert(id.clone(), e.summary());
                }
            }
        }
        outcome
    }
}

/// Per-item results of a batch operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub succeeded: Vec<String>,
    /// Failed ids mapped to a one-line error.
    pub failed: BTreeMap<String, String>,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// One-line summary, e.g. `removed 3 of 4 containers; abc: in use`.
    pub fn describe(&self, kind: ResourceType) -> String {
        let mut msg = format!(
            "removed {} of {} {}",
            self.succeeded.len(),
            self.total(),
            kind.plural()
        );
        for (id, err) in &self.failed {
            msg.push_str(&format!("; {id}: {err}"));
        }
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_lists_failures() {
        let mut outcome = BatchOutcome {
            succeeded: vec!["a".into(), "b".into()],
            ..BatchOutcome::default()
        };
        outcome.failed.insert("c".into(), "image is in use".into());
        assert_eq!(outcome.total(), 3);
        assert!(!outcome.is_complete_success());
        assert_eq!(
            outcome.describe(ResourceType::Image),
            "removed 2 of 3 images; c: image is in use"
        );
    }

    #[test]
    fn empty_batch_is_success() {
        let outcome = BatchOutcome::default();
        assert!(outcome.is_complete_success());
        assert_eq!(outcome.describe(ResourceType::Volume), "removed 0 of 0 volumes");
    }
}
