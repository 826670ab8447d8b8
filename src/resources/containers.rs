use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::docker::{
    self, ContainerState, ContainerStats, ContainerSummary, DockerClient, ResourceType,
};
use crate::format::{StatusKind, format_created, short_id};
use crate::resource::{Operation, Resource, ResourceKind, ResourceManager};

pub struct Containers;

pub type ContainerManager = ResourceManager<Containers>;

impl ResourceKind for Containers {
    type Item = ContainerSummary;

    const TYPE: ResourceType = ResourceType::Container;
    const DEFAULT_TTL: Duration = Duration::from_secs(15);

    fn load(client: &dyn DockerClient) -> docker::Result<Vec<ContainerSummary>> {
        client.list_containers(true)
    }
}

impl Resource for ContainerSummary {
    fn id(&self) -> &str {
        &self.id
    }

    fn matches_search(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(query)
            || self.image.to_lowercase().contains(query)
            || self.status.to_lowercase().contains(query)
            || short_id(&self.id).to_lowercase().contains(query)
    }

    fn matches_filter(&self, key: &str, value: &str) -> bool {
        match key {
            // Matches the status line ("up", "exited") as well as the state
            // word, so `status=running` works too.
            "status" => {
                self.status.to_lowercase().contains(value) || self.state.as_str().contains(value)
            }
            "image" => self.image.to_lowercase().contains(value),
            _ => true,
        }
    }
}

/// Running / stopped / total, for the dashboard card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContainerCounts {
    pub running: usize,
    pub stopped: usize,
    pub total: usize,
}

impl ResourceManager<Containers> {
    pub fn start(&mut self, id: &str) {
        let id = id.to_string();
        self.run_operation(Operation::Start, display_target(self, &id), move |c, _| {
            c.start_container(&id)?;
            Ok("container started".to_string())
        });
    }

    pub fn stop(&mut self, id: &str) {
        let id = id.to_string();
        self.run_operation(Operation::Stop, display_target(self, &id), move |c, _| {
            c.stop_container(&id)?;
            Ok("container stopped".to_string())
        });
    }

    pub fn restart(&mut self, id: &str) {
        let id = id.to_string();
        self.run_operation(Operation::Restart, display_target(self, &id), move |c, _| {
            c.restart_container(&id)?;
            Ok("container restarted".to_string())
        });
    }

    /// Fetch the last `tail` log lines. Blocks on the CLI call.
    pub fn logs(&self, id: &str, tail: usize) -> docker::Result<String> {
        self.client().container_logs(id, tail)
    }

    /// One-shot usage sample. Blocks on the CLI call.
    pub fn stats(&self, id: &str) -> docker::Result<ContainerStats> {
        self.client().container_stats(id)
    }

    pub fn counts(&self) -> ContainerCounts {
        ContainerCounts {
            running: self.count(|c| c.state == ContainerState::Running),
            stopped: self.count(|c| {
                matches!(
                    c.state,
                    ContainerState::Exited | ContainerState::Created | ContainerState::Dead
                )
            }),
            total: self.resources().len(),
        }
    }

    pub fn rows(&self, now: DateTime<Utc>) -> Vec<ContainerRow> {
        self.filtered()
            .iter()
            .map(|c| ContainerRow::new(c, now))
            .collect()
    }
}

fn display_target(manager: &ContainerManager, id: &str) -> String {
    manager
        .get(id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| short_id(id).to_string())
}

/// A container formatted for the table.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerRow {
    pub id: String,
    pub name: String,
    pub image: String,
    pub status: String,
    pub status_kind: StatusKind,
    pub ports: String,
    pub created: String,
}

impl ContainerRow {
    pub fn new(c: &ContainerSummary, now: DateTime<Utc>) -> Self {
        let name = if c.name.is_empty() {
            short_id(&c.id).to_string()
        } else {
            c.name.trim_start_matches('/').to_string()
        };
        let status_kind = match c.state {
            ContainerState::Unknown => StatusKind::from_status(&c.status),
            state => StatusKind::from_status(state.as_str()),
        };
        Self {
            id: c.id.clone(),
            name,
            image: c.image.clone(),
            status: if c.status.is_empty() {
                c.state.as_str().to_string()
            } else {
                c.status.clone()
            },
            status_kind,
            ports: if c.ports.is_empty() {
                "-".to_string()
            } else {
                c.ports.clone()
            },
            created: format_created(c.created, now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(name: &str, state: ContainerState, status: &str) -> ContainerSummary {
        ContainerSummary {
            id: "4f66ad9a0b2e9c1d".into(),
            name: name.into(),
            image: "nginx:1.27".into(),
            command: "nginx -g".into(),
            state,
            status: status.into(),
            ports: String::new(),
            networks: vec!["bridge".into()],
            created: None,
            size_bytes: 0,
        }
    }

    #[test]
    fn search_covers_name_image_status_and_short_id() {
        let c = container("web", ContainerState::Running, "Up 3 hours");
        assert!(c.matches_search("we"));
        assert!(c.matches_search("nginx"));
        assert!(c.matches_search("up 3"));
        assert!(c.matches_search("4f66ad"));
        assert!(!c.matches_search("postgres"));
        // Past the 12-character short id.
        assert!(!c.matches_search("9c1d"));
    }

    #[test]
    fn status_filter_accepts_state_word_or_status_line() {
        let c = container("web", ContainerState::Exited, "Exited (0) 2 days ago");
        assert!(c.matches_filter("status", "exited"));
        assert!(c.matches_filter("status", "(0)"));
        assert!(!c.matches_filter("status", "running"));
        assert!(c.matches_filter("image", "nginx"));
        assert!(c.matches_filter("colour", "blue"));
    }

    #[test]
    fn row_falls_back_to_short_id_and_dash() {
        let c = container("", ContainerState::Running, "Up 1 minute");
        let row = ContainerRow::new(&c, Utc::now());
        assert_eq!(row.name, "4f66ad9a0b2e");
        assert_eq!(row.ports, "-");
        assert_eq!(row.created, "unknown");
        assert_eq!(row.status_kind, StatusKind::Running);
    }

    #[test]
    fn paused_row_uses_state() {
        let c = container("db", ContainerState::Paused, "Up 2 hours (Paused)");
        assert_eq!(ContainerRow::new(&c, Utc::now()).status_kind, StatusKind::Paused);
    }
}
