// Docker client wrapper: CLI invocation, JSON parsing, streaming output, cancellation.

pub mod client;
pub mod engine;
pub mod error;
pub mod parse;
pub mod run;
pub mod types;

pub use client::{BatchOutcome, DockerClient};
pub use engine::{DockerCli, ensure_available};
pub use error::{DockerError, Result};
pub use run::spawn;
pub use types::{
    CancelToken, ContainerState, ContainerStats, ContainerSummary, DiskUsageEntry, ImageSummary,
    NetworkSpec, NetworkSummary, OutputLine, PruneReport, ResourceType, StreamCommand,
    StreamResult, SystemInfo, VolumeSpec, VolumeSummary,
};
