//! Parsing of `docker ... --format '{{json .}}'` output into typed summaries.
//!
//! The CLI prints one JSON object per line for list commands and a single
//! JSON array for `inspect`. Most values arrive as display strings
//! (`"43.2MB"`, `"false"`, `"2024-01-15 10:23:45 +0000 UTC"`), so the raw
//! rows are deserialized as strings and converted here.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::error::{DockerError, Result};
use super::types::{
    ContainerState, ContainerStats, ContainerSummary, DiskUsageEntry, ImageSummary,
    NetworkSummary, PruneReport, SystemInfo, VolumeSummary,
};

// ── Generic helpers ───────────────────────────────────────────────────

/// Deserialize one JSON value per non-blank line.
pub fn parse_json_lines<T: DeserializeOwned>(what: &'static str, text: &str) -> Result<Vec<T>> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| serde_json::from_str(l).map_err(|source| DockerError::Parse { what, source }))
        .collect()
}

/// Convert a size string as printed by the CLI into bytes.
///
/// Accepts decimal units (`kB`, `MB`, `GB`, as used by `docker ps` and
/// `docker images`) and binary units (`KiB`, `MiB`, as used by
/// `docker stats`). Trailing annotations such as `" (virtual 7.8MB)"` or
/// `" (50%)"` are ignored. Anything unparseable, including `N/A`, is 0.
pub fn parse_human_size(raw: &str) -> u64 {
    let token = raw
        .split(|c: char| c.is_whitespace() || c == '(')
        .find(|t| !t.is_empty())
        .unwrap_or("");

    let split = token
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(token.len());
    let (number, unit) = token.split_at(split);

    let Ok(value) = number.parse::<f64>() else {
        return 0;
    };

    let multiplier: f64 = match unit {
        "" | "B" => 1.0,
        "kB" | "KB" | "k" | "K" => 1e3,
        "MB" | "M" => 1e6,
        "GB" | "G" => 1e9,
        "TB" | "T" => 1e12,
        "PB" | "P" => 1e15,
        "KiB" => 1024.0,
        "MiB" => 1024.0 * 1024.0,
        "GiB" => 1024.0 * 1024.0 * 1024.0,
        "TiB" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        _ => return 0,
    };

    (value * multiplier).round() as u64
}

/// Parse a timestamp as printed by the CLI (`2024-01-15 10:23:45 +0000 UTC`,
/// optionally with fractional seconds) or by `inspect` (RFC 3339).
pub fn parse_docker_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    // Drop the trailing zone abbreviation; the numeric offset is authoritative.
    let mut parts = raw.split_whitespace();
    let (date, time, offset) = (parts.next()?, parts.next()?, parts.next()?);
    DateTime::parse_from_str(&format!("{date} {time} {offset}"), "%Y-%m-%d %H:%M:%S%.f %z")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_percent(raw: &str) -> f64 {
    raw.trim().trim_end_matches('%').parse().unwrap_or(0.0)
}

fn parse_flag(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

fn parse_count(raw: &str) -> Option<u32> {
    raw.trim().parse().ok()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

// ── Containers ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct RawContainer {
    #[serde(rename = "ID")]
    id: String,
    names: String,
    image: String,
    command: String,
    state: String,
    status: String,
    ports: String,
    networks: String,
    created_at: String,
    size: String,
}

impl From<RawContainer> for ContainerSummary {
    fn from(raw: RawContainer) -> Self {
        let name = raw
            .names
            .split(',')
            .next()
            .unwrap_or_default()
            .trim_start_matches('/')
            .to_string();
        Self {
            name,
            image: raw.image,
            command: raw.command.trim_matches('"').to_string(),
            state: ContainerState::from_str_lossy(&raw.state),
            status: raw.status,
            ports: raw.ports,
            networks: split_list(&raw.networks),
            created: parse_docker_time(&raw.created_at),
            size_bytes: parse_human_size(&raw.size),
            id: raw.id,
        }
    }
}

pub fn parse_containers(text: &str) -> Result<Vec<ContainerSummary>> {
    let rows: Vec<RawContainer> = parse_json_lines("container list", text)?;
    Ok(rows.into_iter().map(ContainerSummary::from).collect())
}

// ── Images ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct RawImage {
    #[serde(rename = "ID")]
    id: String,
    repository: String,
    tag: String,
    digest: String,
    size: String,
    created_at: String,
    containers: String,
}

impl From<RawImage> for ImageSummary {
    fn from(raw: RawImage) -> Self {
        Self {
            id: raw.id.trim_start_matches("sha256:").to_string(),
            repository: raw.repository,
            tag: raw.tag,
            digest: raw.digest,
            size_bytes: parse_human_size(&raw.size),
            created: parse_docker_time(&raw.created_at),
            containers: parse_count(&raw.containers),
        }
    }
}

pub fn parse_images(text: &str) -> Result<Vec<ImageSummary>> {
    let rows: Vec<RawImage> = parse_json_lines("image list", text)?;
    Ok(rows.into_iter().map(ImageSummary::from).collect())
}

// ── Networks ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct RawNetwork {
    #[serde(rename = "ID")]
    id: String,
    name: String,
    driver: String,
    scope: String,
    internal: String,
    #[serde(rename = "IPv6")]
    ipv6: String,
    created_at: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct NetworkInspect {
    id: String,
    #[serde(rename = "IPAM")]
    ipam: Ipam,
    containers: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct Ipam {
    config: Option<Vec<IpamConfig>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct IpamConfig {
    subnet: String,
    gateway: String,
}

/// Combine `network ls` rows with optional `network inspect` details.
///
/// Inspect output is matched on the full id, which the listed short id
/// prefixes. Rows without a match keep empty IPAM details.
pub fn parse_networks(list: &str, inspect: Option<&str>) -> Result<Vec<NetworkSummary>> {
    let rows: Vec<RawNetwork> = parse_json_lines("network list", list)?;
    let details: Vec<NetworkInspect> = match inspect {
        Some(text) if !text.trim().is_empty() => serde_json::from_str(text)
            .map_err(|source| DockerError::Parse {
                what: "network inspect",
                source,
            })?,
        _ => Vec::new(),
    };

    Ok(rows
        .into_iter()
        .map(|raw| {
            let mut net = NetworkSummary {
                internal: parse_flag(&raw.internal),
                ipv6: parse_flag(&raw.ipv6),
                created: parse_docker_time(&raw.created_at),
                id: raw.id,
                name: raw.name,
                driver: raw.driver,
                scope: raw.scope,
                ..NetworkSummary::default()
            };
            if let Some(detail) = details
                .iter()
                .find(|d| !net.id.is_empty() && d.id.starts_with(&net.id))
            {
                for cfg in detail.ipam.config.iter().flatten() {
                    if !cfg.subnet.is_empty() {
                        net.subnets.push(cfg.subnet.clone());
                    }
                    if !cfg.gateway.is_empty() {
                        net.gateways.push(cfg.gateway.clone());
                    }
                }
                net.containers = detail.containers.as_ref().map_or(0, HashMap::len);
            }
            net
        })
        .collect())
}

// ── Volumes ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct VolumeInspect {
    name: String,
    driver: String,
    scope: String,
    mountpoint: String,
    created_at: String,
    options: Option<BTreeMap<String, String>>,
    labels: Option<BTreeMap<String, String>>,
}

/// Build volume summaries from `volume inspect` output plus the names
/// listed by `volume ls -q --filter dangling=true`.
///
/// Without a dangling list every volume counts as in use, so nothing is
/// offered up as unused on a guess.
pub fn parse_volumes(inspect: &str, dangling: Option<&str>) -> Result<Vec<VolumeSummary>> {
    if inspect.trim().is_empty() {
        return Ok(Vec::new());
    }
    let rows: Vec<VolumeInspect> =
        serde_json::from_str(inspect).map_err(|source| DockerError::Parse {
            what: "volume inspect",
            source,
        })?;
    let unused = dangling_names(dangling);

    Ok(rows
        .into_iter()
        .map(|raw| VolumeSummary {
            in_use: !unused.contains(raw.name.as_str()),
            created: parse_docker_time(&raw.created_at),
            options: raw.options.unwrap_or_default(),
            labels: raw.labels.unwrap_or_default(),
            name: raw.name,
            driver: raw.driver,
            scope: raw.scope,
            mountpoint: raw.mountpoint,
        })
        .collect())
}

/// Name-only rows for when `volume inspect` produced nothing usable.
pub fn volumes_from_names(names: &[&str], dangling: Option<&str>) -> Vec<VolumeSummary> {
    let unused = dangling_names(dangling);
    names
        .iter()
        .map(|name| VolumeSummary {
            name: name.to_string(),
            in_use: !unused.contains(name),
            ..VolumeSummary::default()
        })
        .collect()
}

fn dangling_names(dangling: Option<&str>) -> HashSet<&str> {
    dangling
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

// ── Stats / info / disk usage ─────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct RawStats {
    #[serde(rename = "CPUPerc")]
    cpu_perc: String,
    mem_usage: String,
    mem_perc: String,
    #[serde(rename = "NetIO")]
    net_io: String,
    #[serde(rename = "BlockIO")]
    block_io: String,
    #[serde(rename = "PIDs")]
    pids: String,
}

pub fn parse_stats(text: &str) -> Result<ContainerStats> {
    let rows: Vec<RawStats> = parse_json_lines("container stats", text)?;
    let raw = rows.into_iter().next().unwrap_or_default();
    Ok(ContainerStats {
        cpu_percent: parse_percent(&raw.cpu_perc),
        mem_percent: parse_percent(&raw.mem_perc),
        pids: parse_count(&raw.pids).unwrap_or(0),
        mem_usage: raw.mem_usage,
        net_io: raw.net_io,
        block_io: raw.block_io,
    })
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct RawInfo {
    server_version: String,
    operating_system: String,
    #[serde(rename = "NCPU")]
    ncpu: u32,
    mem_total: u64,
    containers: u32,
    containers_running: u32,
    containers_paused: u32,
    containers_stopped: u32,
    images: u32,
    server_errors: Option<Vec<String>>,
}

pub fn parse_system_info(text: &str) -> Result<SystemInfo> {
    let raw: RawInfo = serde_json::from_str(text.trim()).map_err(|source| DockerError::Parse {
        what: "system info",
        source,
    })?;
    if let Some(errors) = raw.server_errors.filter(|e| !e.is_empty()) {
        return Err(DockerError::DaemonUnavailable(errors.join("; ")));
    }
    Ok(SystemInfo {
        server_version: raw.server_version,
        operating_system: raw.operating_system,
        cpus: raw.ncpu,
        mem_total: raw.mem_total,
        containers: raw.containers,
        containers_running: raw.containers_running,
        containers_paused: raw.containers_paused,
        containers_stopped: raw.containers_stopped,
        images: raw.images,
    })
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct RawDiskUsage {
    #[serde(rename = "Type")]
    kind: String,
    total_count: String,
    active: String,
    size: String,
    reclaimable: String,
}

pub fn parse_disk_usage(text: &str) -> Result<Vec<DiskUsageEntry>> {
    let rows: Vec<RawDiskUsage> = parse_json_lines("disk usage", text)?;
    Ok(rows
        .into_iter()
        .map(|raw| DiskUsageEntry {
            total: parse_count(&raw.total_count).unwrap_or(0),
            active: parse_count(&raw.active).unwrap_or(0),
            size_bytes: parse_human_size(&raw.size),
            reclaimable_bytes: parse_human_size(&raw.reclaimable),
            kind: raw.kind,
        })
        .collect())
}

// ── Prune ─────────────────────────────────────────────────────────────

/// Parse the plain-text report printed by `docker <kind> prune -f`.
///
/// ```text
/// Deleted Images:
/// untagged: alpine@sha256:…
/// deleted: sha256:4e38…
///
/// Total reclaimed space: 7.8MB
/// ```
///
/// Container, network and volume reports list bare ids or names instead of
/// `deleted:` lines; networks omit the reclaimed-space footer.
pub fn parse_prune_output(text: &str) -> PruneReport {
    let mut report = PruneReport::default();

    for line in text.lines().map(str::trim) {
        if line.is_empty() || (line.starts_with("Deleted ") && line.ends_with(':')) {
            continue;
        }
        if let Some(space) = line.strip_prefix("Total reclaimed space:") {
            report.reclaimed_bytes = parse_human_size(space);
            continue;
        }
        if line.starts_with("untagged:") {
            continue;
        }
        let id = line.strip_prefix("deleted:").unwrap_or(line).trim();
        report.deleted.push(id.to_string());
    }

    report
}
