use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::docker::{CancelToken, ContainerStats, DiskUsageEntry, DockerClient, ResourceType, SystemInfo};
use crate::notify::NotificationCenter;
use crate::resource::{ResourceEvent, ResourceList};
use crate::resources::{ContainerManager, ImageManager, NetworkManager, VolumeManager};
use crate::ui::theme::ThemeManager;

use super::status::StatusBar;

/// Top-level navigation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Dashboard,
    Containers,
    Images,
    Networks,
    Volumes,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Dashboard,
        Section::Containers,
        Section::Images,
        Section::Networks,
        Section::Volumes,
    ];

    pub fn index(self) -> usize {
        match self {
            Section::Dashboard => 0,
            Section::Containers => 1,
            Section::Images => 2,
            Section::Networks => 3,
            Section::Volumes => 4,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    pub fn next(self) -> Self {
        let i = (self.index() + 1) % Self::ALL.len();
        Self::ALL[i]
    }

    pub fn prev(self) -> Self {
        let i = (self.index() + Self::ALL.len() - 1) % Self::ALL.len();
        Self::ALL[i]
    }

    pub fn title(self) -> &'static str {
        match self {
            Section::Dashboard => "Dashboard",
            Section::Containers => "Containers",
            Section::Images => "Images",
            Section::Networks => "Networks",
            Section::Volumes => "Volumes",
        }
    }

    /// The resource kind listed in this section; `None` for the dashboard.
    pub fn resource(self) -> Option<ResourceType> {
        match self {
            Section::Dashboard => None,
            Section::Containers => Some(ResourceType::Container),
            Section::Images => Some(ResourceType::Image),
            Section::Networks => Some(ResourceType::Network),
            Section::Volumes => Some(ResourceType::Volume),
        }
    }

    pub fn for_resource(kind: ResourceType) -> Self {
        match kind {
            ResourceType::Container => Section::Containers,
            ResourceType::Image => Section::Images,
            ResourceType::Network => Section::Networks,
            ResourceType::Volume => Section::Volumes,
        }
    }
}

/// What the single-line input at the bottom is collecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    Search,
    /// Space- or comma-separated `key=value` pairs.
    Filter,
    Pull,
    Tag { image: String },
    CreateNetwork,
    CreateVolume,
    Connect { network: String },
    Disconnect { network: String },
}

impl PromptKind {
    pub fn label(&self) -> &'static str {
        match self {
            PromptKind::Search => "Search",
            PromptKind::Filter => "Filter (key=value …)",
            PromptKind::Pull => "Pull image",
            PromptKind::Tag { .. } => "Tag as repository[:tag]",
            PromptKind::CreateNetwork => "New network: name [driver] [subnet]",
            PromptKind::CreateVolume => "New volume: name [driver] [key=value …]",
            PromptKind::Connect { .. } => "Connect container",
            PromptKind::Disconnect { .. } => "Disconnect container",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub buffer: String,
}

/// A destructive action waiting for `y`/`n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirm {
    Delete {
        kind: ResourceType,
        ids: Vec<String>,
        label: String,
    },
    Prune(ResourceType),
    PruneSystem,
}

impl Confirm {
    pub fn question(&self) -> String {
        match self {
            Confirm::Delete { kind, ids, label } if ids.len() == 1 => {
                format!("Delete {kind} {label}?")
            }
            Confirm::Delete { kind, ids, .. } => {
                format!("Delete {} {}?", ids.len(), kind.plural())
            }
            Confirm::Prune(kind) => format!("Remove all unused {}?", kind.plural()),
            Confirm::PruneSystem => {
                "Remove all unused containers, images, networks and volumes?".to_string()
            }
        }
    }
}

/// Full-screen popups.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Help,
    Logs { title: String, text: String },
    Stats { title: String, stats: ContainerStats },
    Loading { title: String },
}

/// Daemon-wide data shown on the dashboard.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub version: Option<String>,
    pub info: Option<SystemInfo>,
    pub disk: Vec<DiskUsageEntry>,
    pub error: Option<String>,
    pub loading: bool,
}

/// A running image pull and the token that cancels it.
#[derive(Debug, Clone)]
pub struct ActivePull {
    pub image: String,
    pub token: CancelToken,
}

/// Top-level application state.
pub struct App {
    pub running: bool,
    pub section: Section,

    pub containers: ContainerManager,
    pub images: ImageManager,
    pub networks: NetworkManager,
    pub volumes: VolumeManager,

    /// Selected row per section, indexed by `Section::index`.
    pub selected: [usize; 5],
    /// Ids marked for batch deletion, per kind.
    pub marked: BTreeMap<ResourceType, BTreeSet<String>>,

    pub prompt: Option<Prompt>,
    pub confirm: Option<Confirm>,
    pub overlay: Option<Overlay>,
    pub overlay_scroll: u16,

    pub dashboard: Dashboard,
    pub notifications: NotificationCenter,
    pub status: StatusBar,
    pub themes: ThemeManager,

    /// The image pull in progress, if any.
    pub pull: Option<ActivePull>,
    /// Images of cancelled pulls whose completion has not arrived yet.
    pub cancelled_pulls: Vec<String>,
    pub log_tail: usize,
    pub auto_refresh: Option<Duration>,
    pub(crate) last_auto_refresh: Instant,
    /// Kinds in the current multi-kind reload; zero when none is running.
    pub(crate) load_batch: usize,

    pub(crate) client: Arc<dyn DockerClient>,
    pub(crate) events: Vec<Receiver<ResourceEvent>>,
    pub(crate) dashboard_rx: Option<Receiver<Dashboard>>,
    pub(crate) overlay_rx: Option<Receiver<Result<Overlay, String>>>,
}

impl App {
    pub fn new(client: Arc<dyn DockerClient>, cfg: &Config, themes: ThemeManager) -> Self {
        let ttl = &cfg.cache_ttl;
        let mut app = Self {
            running: true,
            section: Section::Dashboard,
            containers: ContainerManager::new(
                Arc::clone(&client),
                ttl.for_kind(ResourceType::Container),
            ),
            images: ImageManager::new(Arc::clone(&client), ttl.for_kind(ResourceType::Image)),
            networks: NetworkManager::new(
                Arc::clone(&client),
                ttl.for_kind(ResourceType::Network),
            ),
            volumes: VolumeManager::new(Arc::clone(&client), ttl.for_kind(ResourceType::Volume)),
            selected: [0; 5],
            marked: BTreeMap::new(),
            prompt: None,
            confirm: None,
            overlay: None,
            overlay_scroll: 0,
            dashboard: Dashboard::default(),
            notifications: NotificationCenter::new(
                cfg.max_notifications,
                cfg.notification_timeout(),
            ),
            status: StatusBar::default(),
            themes,
            pull: None,
            cancelled_pulls: Vec::new(),
            log_tail: cfg.log_tail,
            auto_refresh: cfg.auto_refresh.as_duration(),
            last_auto_refresh: Instant::now(),
            load_batch: 0,
            client,
            events: Vec::new(),
            dashboard_rx: None,
            overlay_rx: None,
        };

        for kind in ResourceType::ALL {
            let rx = app.manager_mut(kind).subscribe();
            app.events.push(rx);
        }
        app
    }

    pub fn client(&self) -> &dyn DockerClient {
        self.client.as_ref()
    }

    pub fn manager(&self, kind: ResourceType) -> &dyn ResourceList {
        match kind {
            ResourceType::Container => &self.containers,
            ResourceType::Image => &self.images,
            ResourceType::Network => &self.networks,
            ResourceType::Volume => &self.volumes,
        }
    }

    pub fn manager_mut(&mut self, kind: ResourceType) -> &mut dyn ResourceList {
        match kind {
            ResourceType::Container => &mut self.containers,
            ResourceType::Image => &mut self.images,
            ResourceType::Network => &mut self.networks,
            ResourceType::Volume => &mut self.volumes,
        }
    }

    /// Manager behind the current section, if it lists resources.
    pub fn current(&self) -> Option<&dyn ResourceList> {
        self.section.resource().map(|k| self.manager(k))
    }

    pub fn current_mut(&mut self) -> Option<&mut dyn ResourceList> {
        let kind = self.section.resource()?;
        Some(self.manager_mut(kind))
    }

    // ── Selection ─────────────────────────────────────────────────────

    pub fn selected_index(&self) -> usize {
        self.selected[self.section.index()]
    }

    pub fn selected_id(&self) -> Option<String> {
        self.current()?.id_at(self.selected_index())
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.current().map_or(0, |m| m.filtered_len());
        let slot = &mut self.selected[self.section.index()];
        *slot = if len == 0 {
            0
        } else {
            slot.saturating_add_signed(delta).min(len - 1)
        };
    }

    pub fn select_first(&mut self) {
        self.selected[self.section.index()] = 0;
    }

    pub fn select_last(&mut self) {
        let len = self.current().map_or(0, |m| m.filtered_len());
        self.selected[self.section.index()] = len.saturating_sub(1);
    }

    /// Keep every section's selection inside its filtered list.
    pub fn clamp_indices(&mut self) {
        for kind in ResourceType::ALL {
            let len = self.manager(kind).filtered_len();
            let slot = &mut self.selected[Section::for_resource(kind).index()];
            *slot = (*slot).min(len.saturating_sub(1));
        }
    }

    pub fn set_section(&mut self, section: Section) {
        self.section = section;
        self.prompt = None;
        match section.resource() {
            Some(kind) => self.manager_mut(kind).refresh(false),
            None => self.load_dashboard(),
        }
    }

    // ── Marks ─────────────────────────────────────────────────────────

    pub fn toggle_mark(&mut self) {
        let (Some(kind), Some(id)) = (self.section.resource(), self.selected_id()) else {
            return;
        };
        let marks = self.marked.entry(kind).or_default();
        if !marks.remove(&id) {
            marks.insert(id);
        }
    }

    pub fn is_marked(&self, kind: ResourceType, id: &str) -> bool {
        self.marked.get(&kind).is_some_and(|m| m.contains(id))
    }

    pub fn marked_ids(&self, kind: ResourceType) -> Vec<String> {
        self.marked
            .get(&kind)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear_marks(&mut self, kind: ResourceType) {
        self.marked.remove(&kind);
    }

    /// Drop marks for items that no longer exist.
    pub(crate) fn prune_marks(&mut self, kind: ResourceType) {
        let Some(marks) = self.marked.get(&kind) else {
            return;
        };
        let keep: BTreeSet<String> = marks
            .iter()
            .filter(|id| self.manager(kind).contains(id))
            .cloned()
            .collect();
        self.marked.insert(kind, keep);
    }

    pub fn is_busy(&self) -> bool {
        self.dashboard.loading
            || self.overlay_rx.is_some()
            || ResourceType::ALL
                .iter()
                .any(|k| self.manager(*k).is_busy())
    }
}
