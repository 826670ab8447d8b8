//! In-memory `DockerClient` shared by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use dockdeck::docker::{
    CancelToken, ContainerState, ContainerStats, ContainerSummary, DiskUsageEntry, DockerClient,
    DockerError, ImageSummary, NetworkSpec, NetworkSummary, PruneReport, ResourceType,
    SystemInfo, VolumeSpec, VolumeSummary,
};
use dockdeck::resource::ResourceEvent;

#[derive(Debug, Default)]
struct State {
    containers: Vec<ContainerSummary>,
    images: Vec<ImageSummary>,
    networks: Vec<NetworkSummary>,
    volumes: Vec<VolumeSummary>,
    /// Ids whose removal fails with "in use".
    locked: BTreeSet<String>,
    /// When set, every call fails as if the daemon were down.
    offline: bool,
    calls: Vec<String>,
}

/// Fake daemon with a handful of resources of each kind.
#[derive(Debug, Default)]
pub struct FakeDocker {
    state: Mutex<State>,
    list_calls: AtomicUsize,
    /// While set, pulls wait until cancelled or released.
    hold_pulls: AtomicBool,
}

fn failed(command: &str, stderr: &str) -> DockerError {
    DockerError::CommandFailed {
        command: command.to_string(),
        code: Some(1),
        stderr: format!("Error response from daemon: {stderr}"),
    }
}

pub fn container(id: &str, name: &str, state: ContainerState) -> ContainerSummary {
    let status = match state {
        ContainerState::Running => "Up 5 minutes".to_string(),
        _ => "Exited (0) 2 hours ago".to_string(),
    };
    ContainerSummary {
        id: id.to_string(),
        name: name.to_string(),
        image: "nginx:latest".to_string(),
        command: "nginx -g daemon off;".to_string(),
        state,
        status,
        ports: String::new(),
        networks: vec!["bridge".to_string()],
        created: None,
        size_bytes: 0,
    }
}

pub fn image(id: &str, repository: &str, tag: &str, size_bytes: u64) -> ImageSummary {
    ImageSummary {
        id: id.to_string(),
        repository: repository.to_string(),
        tag: tag.to_string(),
        digest: String::new(),
        size_bytes,
        created: None,
        containers: None,
    }
}

pub fn network(id: &str, name: &str, driver: &str) -> NetworkSummary {
    NetworkSummary {
        id: id.to_string(),
        name: name.to_string(),
        driver: driver.to_string(),
        scope: "local".to_string(),
        ..NetworkSummary::default()
    }
}

pub fn volume(name: &str, in_use: bool) -> VolumeSummary {
    VolumeSummary {
        name: name.to_string(),
        driver: "local".to_string(),
        scope: "local".to_string(),
        mountpoint: format!("/var/lib/docker/volumes/{name}/_data"),
        in_use,
        ..VolumeSummary::default()
    }
}

impl FakeDocker {
    pub fn new() -> Self {
        let fake = Self::default();
        {
            let mut s = fake.state();
            s.containers = vec![
                container("c1aaaaaaaaaaaa", "web", ContainerState::Running),
                container("c2bbbbbbbbbbbb", "db", ContainerState::Exited),
                container("c3cccccccccccc", "cache", ContainerState::Running),
            ];
            s.images = vec![
                image("sha256:1111111111111111", "nginx", "latest", 187_000_000),
                image("sha256:2222222222222222", "redis", "7", 45_000_000),
                image("sha256:3333333333333333", "<none>", "<none>", 10_000_000),
            ];
            s.networks = vec![
                network("n1", "bridge", "bridge"),
                network("n2", "host", "host"),
                network("n3", "none", "null"),
                network("n4", "backend", "bridge"),
            ];
            s.volumes = vec![volume("pgdata", true), volume("scratch", false)];
        }
        fake
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn lock_id(&self, id: &str) {
        self.state().locked.insert(id.to_string());
    }

    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    pub fn hold_pulls(&self, hold: bool) {
        self.hold_pulls.store(hold, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    fn check(&self, call: String) -> Result<(), DockerError> {
        let mut s = self.state();
        if s.offline {
            return Err(DockerError::DaemonUnavailable(
                "Cannot connect to the Docker daemon".to_string(),
            ));
        }
        s.calls.push(call);
        Ok(())
    }

    fn listed(&self, call: &str) -> Result<(), DockerError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check(call.to_string())
    }

    fn set_container_state(&self, id: &str, state: ContainerState) -> Result<(), DockerError> {
        let mut s = self.state();
        let c = s
            .containers
            .iter_mut()
            .find(|c| c.id == id || c.name == id)
            .ok_or_else(|| failed("container start", &format!("No such container: {id}")))?;
        c.state = state;
        c.status = match state {
            ContainerState::Running => "Up Less than a second".to_string(),
            _ => "Exited (0) Less than a second ago".to_string(),
        };
        Ok(())
    }
}

impl DockerClient for FakeDocker {
    fn ping(&self) -> dockdeck::docker::Result<String> {
        self.check("version".into())?;
        Ok("27.1.1".to_string())
    }

    fn list_containers(&self, _all: bool) -> dockdeck::docker::Result<Vec<ContainerSummary>> {
        self.listed("ps")?;
        Ok(self.state().containers.clone())
    }

    fn list_images(&self) -> dockdeck::docker::Result<Vec<ImageSummary>> {
        self.listed("images")?;
        Ok(self.state().images.clone())
    }

    fn list_networks(&self) -> dockdeck::docker::Result<Vec<NetworkSummary>> {
        self.listed("network ls")?;
        Ok(self.state().networks.clone())
    }

    fn list_volumes(&self) -> dockdeck::docker::Result<Vec<VolumeSummary>> {
        self.listed("volume ls")?;
        Ok(self.state().volumes.clone())
    }

    fn start_container(&self, id: &str) -> dockdeck::docker::Result<()> {
        self.check(format!("start {id}"))?;
        self.set_container_state(id, ContainerState::Running)
    }

    fn stop_container(&self, id: &str) -> dockdeck::docker::Result<()> {
        self.check(format!("stop {id}"))?;
        self.set_container_state(id, ContainerState::Exited)
    }

    fn restart_container(&self, id: &str) -> dockdeck::docker::Result<()> {
        self.check(format!("restart {id}"))?;
        self.set_container_state(id, ContainerState::Running)
    }

    fn container_logs(&self, id: &str, tail: usize) -> dockdeck::docker::Result<String> {
        self.check(format!("logs {id}"))?;
        Ok((1..=tail.min(3))
            .map(|i| format!("line {i}\n"))
            .collect())
    }

    fn container_stats(&self, id: &str) -> dockdeck::docker::Result<ContainerStats> {
        self.check(format!("stats {id}"))?;
        Ok(ContainerStats {
            cpu_percent: 1.5,
            mem_usage: "10MiB / 1GiB".to_string(),
            mem_percent: 0.98,
            net_io: "1kB / 2kB".to_string(),
            block_io: "0B / 0B".to_string(),
            pids: 4,
        })
    }

    fn pull_image(
        &self,
        name: &str,
        cancel: &CancelToken,
        on_line: &mut dyn FnMut(&str),
    ) -> dockdeck::docker::Result<()> {
        self.check(format!("pull {name}"))?;
        while self.hold_pulls.load(Ordering::SeqCst) && !cancel.is_cancelled() {
            std::thread::sleep(Duration::from_millis(5));
        }
        for line in ["latest: Pulling from library", "Digest: sha256:abc", "Status: Downloaded"] {
            if cancel.is_cancelled() {
                return Err(DockerError::Cancelled);
            }
            on_line(line);
        }
        let (repository, tag) = name.split_once(':').unwrap_or((name, "latest"));
        self.state()
            .images
            .push(image("sha256:4444444444444444", repository, tag, 5_000_000));
        Ok(())
    }

    fn tag_image(&self, id: &str, repository: &str, tag: &str) -> dockdeck::docker::Result<()> {
        self.check(format!("tag {id} {repository}:{tag}"))?;
        let mut s = self.state();
        let source = s
            .images
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| failed("tag", &format!("No such image: {id}")))?;
        s.images.push(ImageSummary {
            repository: repository.to_string(),
            tag: tag.to_string(),
            ..source
        });
        Ok(())
    }

    fn create_network(&self, spec: &NetworkSpec) -> dockdeck::docker::Result<String> {
        self.check(format!("network create {}", spec.name))?;
        let mut s = self.state();
        if s.networks.iter().any(|n| n.name == spec.name) {
            return Err(failed(
                "network create",
                &format!("network with name {} already exists", spec.name),
            ));
        }
        let id = format!("n{}", s.networks.len() + 1);
        s.networks.push(network(&id, &spec.name, &spec.driver));
        Ok(id)
    }

    fn connect_network(&self, network: &str, container: &str) -> dockdeck::docker::Result<()> {
        self.check(format!("network connect {network} {container}"))
    }

    fn disconnect_network(&self, network: &str, container: &str) -> dockdeck::docker::Result<()> {
        self.check(format!("network disconnect {network} {container}"))
    }

    fn create_volume(&self, spec: &VolumeSpec) -> dockdeck::docker::Result<String> {
        self.check(format!("volume create {}", spec.name))?;
        self.state().volumes.push(volume(&spec.name, false));
        Ok(spec.name.clone())
    }

    fn remove(&self, kind: ResourceType, id: &str, force: bool) -> dockdeck::docker::Result<()> {
        self.check(format!("rm {kind} {id} force={force}"))?;
        let mut s = self.state();
        if s.locked.contains(id) {
            return Err(failed(
                &format!("{} rm", kind.noun()),
                &format!("{} {id} is in use", kind.noun()),
            ));
        }
        let before = match kind {
            ResourceType::Container => {
                let n = s.containers.len();
                s.containers.retain(|c| c.id != id);
                n - s.containers.len()
            }
            ResourceType::Image => {
                let n = s.images.len();
                s.images.retain(|i| i.id != id);
                n - s.images.len()
            }
            ResourceType::Network => {
                let n = s.networks.len();
                s.networks.retain(|i| i.id != id);
                n - s.networks.len()
            }
            ResourceType::Volume => {
                let n = s.volumes.len();
                s.volumes.retain(|v| v.name != id);
                n - s.volumes.len()
            }
        };
        if before == 0 {
            return Err(failed(
                &format!("{} rm", kind.noun()),
                &format!("No such {}: {id}", kind.noun()),
            ));
        }
        Ok(())
    }

    fn prune(&self, kind: ResourceType) -> dockdeck::docker::Result<PruneReport> {
        self.check(format!("prune {kind}"))?;
        let mut s = self.state();
        let mut report = PruneReport::default();
        match kind {
            ResourceType::Container => {
                let (gone, kept) = s
                    .containers
                    .drain(..)
                    .partition::<Vec<_>, _>(|c| c.state != ContainerState::Running);
                report.deleted = gone.into_iter().map(|c| c.id).collect();
                s.containers = kept;
            }
            ResourceType::Image => {
                let (gone, kept) = s
                    .images
                    .drain(..)
                    .partition::<Vec<_>, _>(|i| i.is_dangling());
                report.reclaimed_bytes = gone.iter().map(|i| i.size_bytes).sum();
                report.deleted = gone.into_iter().map(|i| i.id).collect();
                s.images = kept;
            }
            ResourceType::Network => {
                let (gone, kept) = s
                    .networks
                    .drain(..)
                    .partition::<Vec<_>, _>(|n| !n.is_builtin() && n.containers == 0);
                report.deleted = gone.into_iter().map(|n| n.name).collect();
                s.networks = kept;
            }
            ResourceType::Volume => {
                let (gone, kept) = s
                    .volumes
                    .drain(..)
                    .partition::<Vec<_>, _>(|v| !v.in_use);
                report.deleted = gone.into_iter().map(|v| v.name).collect();
                s.volumes = kept;
            }
        }
        Ok(report)
    }

    fn system_info(&self) -> dockdeck::docker::Result<SystemInfo> {
        self.check("info".into())?;
        let s = self.state();
        let running = s
            .containers
            .iter()
            .filter(|c| c.state == ContainerState::Running)
            .count() as u32;
        Ok(SystemInfo {
            server_version: "27.1.1".to_string(),
            operating_system: "Fake Linux".to_string(),
            cpus: 4,
            mem_total: 8 * 1024 * 1024 * 1024,
            containers: s.containers.len() as u32,
            containers_running: running,
            containers_paused: 0,
            containers_stopped: s.containers.len() as u32 - running,
            images: s.images.len() as u32,
        })
    }

    fn disk_usage(&self) -> dockdeck::docker::Result<Vec<DiskUsageEntry>> {
        self.check("system df".into())?;
        let s = self.state();
        Ok(vec![DiskUsageEntry {
            kind: "Images".to_string(),
            total: s.images.len() as u32,
            active: 1,
            size_bytes: s.images.iter().map(|i| i.size_bytes).sum(),
            reclaimable_bytes: 10_000_000,
        }])
    }
}

/// Call `poll` until `done` holds, failing the test after two seconds.
pub fn wait_until(mut poll: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if poll() {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("condition not reached within 2s");
}

/// Everything currently queued on `rx`.
pub fn drain(rx: &Receiver<ResourceEvent>) -> Vec<ResourceEvent> {
    rx.try_iter().collect()
}
