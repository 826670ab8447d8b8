use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Cooperative cancellation token backed by an `AtomicBool`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Describes a streamed docker invocation. `args` is the full argument list
/// passed after the program (the client is responsible for assembling it).
#[derive(Debug, Clone)]
pub struct StreamCommand {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

/// Outcome of a streamed invocation.
#[derive(Debug)]
pub struct StreamResult {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub log: String,
    pub cancelled: bool,
    pub timed_out: bool,
}

/// Streamed output from a running docker command.
#[derive(Debug)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
    Done(StreamResult),
}

/// The four resource kinds the daemon exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    Container,
    Image,
    Network,
    Volume,
}

impl ResourceType {
    pub const ALL: [ResourceType; 4] = [
        ResourceType::Container,
        ResourceType::Image,
        ResourceType::Network,
        ResourceType::Volume,
    ];

    /// Management-command noun used on the docker command line.
    pub fn noun(self) -> &'static str {
        match self {
            ResourceType::Container => "container",
            ResourceType::Image => "image",
            ResourceType::Network => "network",
            ResourceType::Volume => "volume",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            ResourceType::Container => "containers",
            ResourceType::Image => "images",
            ResourceType::Network => "networks",
            ResourceType::Volume => "volumes",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

/// Lifecycle state reported by `docker ps`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerState {
    Running,
    Paused,
    Restarting,
    Created,
    Exited,
    Dead,
    Removing,
    #[default]
    Unknown,
}

impl ContainerState {
    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => Self::Running,
            "paused" => Self::Paused,
            "restarting" => Self::Restarting,
            "created" => Self::Created,
            "exited" => Self::Exited,
            "dead" => Self::Dead,
            "removing" => Self::Removing,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Restarting => "restarting",
            Self::Created => "created",
            Self::Exited => "exited",
            Self::Dead => "dead",
            Self::Removing => "removing",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSummary {
    pub id: String,
    pub name: String,
    pub image: String,
    pub command: String,
    pub state: ContainerState,
    /// Human status line, e.g. `Up 2 hours` or `Exited (0) 3 days ago`.
    pub status: String,
    pub ports: String,
    pub networks: Vec<String>,
    pub created: Option<DateTime<Utc>>,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageSummary {
    pub id: String,
    pub repository: String,
    pub tag: String,
    pub digest: String,
    pub size_bytes: u64,
    pub created: Option<DateTime<Utc>>,
    /// Number of containers using the image, when the daemon reports it.
    pub containers: Option<u32>,
}

impl ImageSummary {
    /// `repository:tag`, or `None` for untagged images.
    pub fn repo_tag(&self) -> Option<String> {
        if self.repository == "<none>" {
            return None;
        }
        if self.tag == "<none>" || self.tag.is_empty() {
            Some(self.repository.clone())
        } else {
            Some(format!("{}:{}", self.repository, self.tag))
        }
    }

    pub fn is_dangling(&self) -> bool {
        self.repository == "<none>" && self.tag == "<none>"
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NetworkSummary {
    pub id: String,
    pub name: String,
    pub driver: String,
    pub scope: String,
    pub internal: bool,
    pub ipv6: bool,
    pub created: Option<DateTime<Utc>>,
    pub subnets: Vec<String>,
    pub gateways: Vec<String>,
    pub containers: usize,
}

impl NetworkSummary {
    /// Networks the daemon creates on its own and refuses to remove.
    pub fn is_builtin(&self) -> bool {
        matches!(self.name.as_str(), "bridge" | "host" | "none")
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct VolumeSummary {
    pub name: String,
    pub driver: String,
    pub scope: String,
    pub mountpoint: String,
    pub created: Option<DateTime<Utc>>,
    pub options: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
    /// Referenced by at least one container (i.e. not dangling).
    pub in_use: bool,
}

impl VolumeSummary {
    pub fn is_local(&self) -> bool {
        self.driver == "local"
    }
}

/// One-shot resource usage sample from `docker stats --no-stream`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContainerStats {
    pub cpu_percent: f64,
    pub mem_usage: String,
    pub mem_percent: f64,
    pub net_io: String,
    pub block_io: String,
    pub pids: u32,
}

/// Daemon-wide facts from `docker info`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SystemInfo {
    pub server_version: String,
    pub operating_system: String,
    pub cpus: u32,
    pub mem_total: u64,
    pub containers: u32,
    pub containers_running: u32,
    pub containers_paused: u32,
    pub containers_stopped: u32,
    pub images: u32,
}

/// One row of `docker system df`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiskUsageEntry {
    pub kind: String,
    pub total: u32,
    pub active: u32,
    pub size_bytes: u64,
    pub reclaimable_bytes: u64,
}

/// Result of a prune operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PruneReport {
    pub deleted: Vec<String>,
    pub reclaimed_bytes: u64,
}

impl PruneReport {
    pub fn merge(&mut self, other: PruneReport) {
        self.deleted.extend(other.deleted);
        self.reclaimed_bytes += other.reclaimed_bytes;
    }
}

/// Parameters for `docker network create`.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSpec {
    pub name: String,
    pub driver: String,
    pub subnet: Option<String>,
}

impl NetworkSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: "bridge".to_string(),
            subnet: None,
        }
    }
}

/// Parameters for `docker volume create`.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeSpec {
    pub name: String,
    pub driver: String,
    pub options: BTreeMap<String, String>,
}

impl VolumeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: "local".to_string(),
            options: BTreeMap::new(),
        }
    }
}
