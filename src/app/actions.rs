use std::sync::Arc;
use std::sync::mpsc;

use tracing::{debug, warn};

use crate::docker::{NetworkSpec, ResourceType, VolumeSpec};
use crate::format::short_id;
use crate::resource::{Filters, Operation, Resource};

use super::state::{
    ActivePull, App, Confirm, Dashboard, Overlay, Prompt, PromptKind, Section,
};

/// Target label for a system-wide prune, so its completion can be told
/// apart from a per-kind prune.
pub(crate) const SYSTEM_TARGET: &str = "system";

/// Parse `key=value` pairs separated by spaces or commas. Pairs without `=`
/// are ignored.
pub fn parse_filters(input: &str) -> Filters {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .collect()
}

/// Split `repository[:tag]`, leaving registry ports (`host:5000/app`) alone.
pub fn split_repo_tag(input: &str) -> (String, String) {
    let input = input.trim();
    match input.rsplit_once(':') {
        Some((repo, tag)) if !tag.contains('/') && !repo.is_empty() => {
            (repo.to_string(), tag.to_string())
        }
        _ => (input.to_string(), "latest".to_string()),
    }
}

impl App {
    // ── Refresh ───────────────────────────────────────────────────────

    pub fn refresh_current(&mut self, force: bool) {
        match self.current_mut() {
            Some(manager) => manager.refresh(force),
            None => self.load_dashboard(),
        }
    }

    pub fn refresh_all(&mut self, force: bool) {
        self.refresh_kinds(&ResourceType::ALL, force);
        self.load_dashboard();
    }

    /// Refresh several kinds, tracking their combined progress in the
    /// status bar.
    pub(crate) fn refresh_kinds(&mut self, kinds: &[ResourceType], force: bool) {
        for &kind in kinds {
            self.manager_mut(kind).refresh(force);
        }
        let loading = self.kinds_loading();
        if loading > 1 {
            self.load_batch = loading;
            self.status.set_progress(0.0, format!("0/{loading} kinds"));
        }
    }

    pub(crate) fn kinds_loading(&self) -> usize {
        ResourceType::ALL
            .into_iter()
            .filter(|&k| self.manager(k).is_loading())
            .count()
    }

    /// Fetch version, `docker info` and `docker system df` in the background.
    pub fn load_dashboard(&mut self) {
        if self.dashboard.loading {
            return;
        }
        self.dashboard.loading = true;

        let client = Arc::clone(&self.client);
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let mut data = Dashboard::default();
            match client.ping() {
                Ok(version) => {
                    data.version = Some(version);
                    match client.system_info() {
                        Ok(info) => data.info = Some(info),
                        Err(e) => data.error = Some(e.summary()),
                    }
                    match client.disk_usage() {
                        Ok(disk) => data.disk = disk,
                        Err(e) => warn!(error = %e, "disk usage unavailable"),
                    }
                }
                Err(e) => data.error = Some(e.summary()),
            }
            let _ = tx.send(data);
        });
        self.dashboard_rx = Some(rx);
    }

    // ── Prompt ────────────────────────────────────────────────────────

    pub fn open_prompt(&mut self, kind: PromptKind) {
        let buffer = match &kind {
            PromptKind::Search => self
                .current()
                .map(|m| m.search_query().to_string())
                .unwrap_or_default(),
            PromptKind::Filter => self
                .current()
                .map(|m| {
                    m.filters()
                        .iter()
                        .map(|(k, v)| format!("{k}={v}"))
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default(),
            _ => String::new(),
        };
        self.prompt = Some(Prompt { kind, buffer });
    }

    pub fn prompt_push(&mut self, c: char) {
        if let Some(prompt) = &mut self.prompt {
            prompt.buffer.push(c);
        }
        self.live_search();
    }

    pub fn prompt_backspace(&mut self) {
        if let Some(prompt) = &mut self.prompt {
            prompt.buffer.pop();
        }
        self.live_search();
    }

    /// Search narrows the list as the user types.
    fn live_search(&mut self) {
        let Some(Prompt {
            kind: PromptKind::Search,
            buffer,
        }) = &self.prompt
        else {
            return;
        };
        let query = buffer.clone();
        if let Some(manager) = self.current_mut() {
            manager.search(&query);
        }
        self.select_first();
    }

    /// Abandon the prompt. Cancelling a search also clears it.
    pub fn cancel_prompt(&mut self) {
        if let Some(Prompt {
            kind: PromptKind::Search,
            ..
        }) = self.prompt.take()
            && let Some(manager) = self.current_mut()
        {
            manager.clear_search();
        }
    }

    pub fn submit_prompt(&mut self) {
        let Some(Prompt { kind, buffer }) = self.prompt.take() else {
            return;
        };
        let input = buffer.trim();

        match kind {
            PromptKind::Search => {
                if let Some(manager) = self.current_mut() {
                    manager.search(input);
                }
            }
            PromptKind::Filter => {
                let filters = parse_filters(input);
                if let Some(manager) = self.current_mut() {
                    if filters.is_empty() {
                        manager.clear_filters();
                    } else {
                        manager.filter(filters);
                    }
                }
                self.select_first();
            }
            _ if input.is_empty() => {}
            PromptKind::Pull => self.start_pull(input),
            PromptKind::Tag { image } => {
                let (repository, tag) = split_repo_tag(input);
                self.images.tag(&image, &repository, &tag);
            }
            PromptKind::CreateNetwork => {
                let mut words = input.split_whitespace();
                let Some(name) = words.next() else { return };
                let mut spec = NetworkSpec::new(name);
                if let Some(driver) = words.next() {
                    spec.driver = driver.to_string();
                }
                spec.subnet = words.next().map(str::to_string);
                self.networks.create(spec);
            }
            PromptKind::CreateVolume => {
                let mut words = input.split_whitespace();
                let Some(name) = words.next() else { return };
                let mut spec = VolumeSpec::new(name);
                for word in words {
                    match word.split_once('=') {
                        Some((k, v)) => {
                            spec.options.insert(k.to_string(), v.to_string());
                        }
                        None => spec.driver = word.to_string(),
                    }
                }
                self.volumes.create(spec);
            }
            PromptKind::Connect { network } => self.networks.connect(&network, input),
            PromptKind::Disconnect { network } => self.networks.disconnect(&network, input),
        }
    }

    pub fn clear_search_and_filters(&mut self) {
        if let Some(manager) = self.current_mut() {
            manager.clear_search();
            manager.clear_filters();
        }
        self.select_first();
    }

    // ── Destructive actions ───────────────────────────────────────────

    /// Ask to delete the marked items, or the selected one if none are
    /// marked.
    pub fn request_delete(&mut self) {
        let Some(kind) = self.section.resource() else {
            return;
        };

        let mut ids = self.marked_ids(kind);
        if ids.is_empty() {
            ids.extend(self.selected_id());
        }
        if kind == ResourceType::Network {
            let builtin: Vec<String> = ids
                .iter()
                .filter(|id| self.networks.get(id).is_some_and(|n| n.is_builtin()))
                .cloned()
                .collect();
            if !builtin.is_empty() {
                self.notifications
                    .warning("Built-in networks (bridge, host, none) cannot be removed");
                ids.retain(|id| !builtin.contains(id));
            }
        }
        if ids.is_empty() {
            return;
        }

        let label = self.display_name(kind, &ids[0]);
        self.confirm = Some(Confirm::Delete { kind, ids, label });
    }

    pub fn request_prune(&mut self) {
        self.confirm = Some(match self.section.resource() {
            Some(kind) => Confirm::Prune(kind),
            None => Confirm::PruneSystem,
        });
    }

    pub fn confirm_yes(&mut self) {
        let Some(confirm) = self.confirm.take() else {
            return;
        };
        debug!(?confirm, "confirmed");
        match confirm {
            Confirm::Delete { kind, mut ids, .. } => {
                if ids.len() == 1 {
                    if let Some(id) = ids.pop() {
                        self.manager_mut(kind).delete(&id);
                    }
                } else {
                    self.manager_mut(kind).delete_many(ids);
                }
                self.clear_marks(kind);
            }
            Confirm::Prune(kind) => self.manager_mut(kind).prune(),
            Confirm::PruneSystem => {
                self.containers
                    .run_operation(Operation::Prune, SYSTEM_TARGET, |client, _| {
                        let report = client.prune_system()?;
                        Ok(format!(
                            "system prune removed {} items, reclaimed {}",
                            report.deleted.len(),
                            crate::format::format_size(report.reclaimed_bytes)
                        ))
                    });
            }
        }
    }

    pub fn confirm_no(&mut self) {
        self.confirm = None;
    }

    // ── Kind-specific actions ─────────────────────────────────────────

    pub fn start_selected(&mut self) {
        if let Some(id) = self.selected_in(Section::Containers) {
            self.containers.start(&id);
        }
    }

    pub fn stop_selected(&mut self) {
        if let Some(id) = self.selected_in(Section::Containers) {
            self.containers.stop(&id);
        }
    }

    pub fn restart_selected(&mut self) {
        if let Some(id) = self.selected_in(Section::Containers) {
            self.containers.restart(&id);
        }
    }

    pub fn show_logs(&mut self) {
        let Some(id) = self.selected_in(Section::Containers) else {
            return;
        };
        let title = format!("Logs: {}", self.display_name(ResourceType::Container, &id));
        let tail = self.log_tail;
        self.open_in_background(title.clone(), move |client| {
            let text = client.container_logs(&id, tail)?;
            Ok(Overlay::Logs { title, text })
        });
    }

    pub fn show_stats(&mut self) {
        let Some(id) = self.selected_in(Section::Containers) else {
            return;
        };
        let title = format!("Stats: {}", self.display_name(ResourceType::Container, &id));
        self.open_in_background(title.clone(), move |client| {
            let stats = client.container_stats(&id)?;
            Ok(Overlay::Stats { title, stats })
        });
    }

    pub fn start_pull(&mut self, name: &str) {
        if self.pull.is_some() {
            self.notifications.warning("A pull is already running");
            return;
        }
        let image = name.trim().to_string();
        let token = self.images.pull(&image);
        self.pull = Some(ActivePull { image, token });
    }

    /// Cancel the running pull. Returns false if none was running.
    pub fn cancel_pull(&mut self) -> bool {
        match self.pull.take() {
            Some(active) => {
                active.token.cancel();
                self.cancelled_pulls.push(active.image);
                self.status.set_message("Cancelling pull…");
                true
            }
            None => false,
        }
    }

    pub fn open_tag_prompt(&mut self) {
        if let Some(image) = self.selected_in(Section::Images) {
            self.open_prompt(PromptKind::Tag { image });
        }
    }

    pub fn open_connect_prompt(&mut self, connect: bool) {
        let Some(id) = self.selected_in(Section::Networks) else {
            return;
        };
        let network = self.display_name(ResourceType::Network, &id);
        self.open_prompt(if connect {
            PromptKind::Connect { network }
        } else {
            PromptKind::Disconnect { network }
        });
    }

    pub fn toggle_theme(&mut self) {
        let name = self.themes.toggle().to_string();
        self.notifications.info(format!("Theme: {name}"));
    }

    // ── Helpers ───────────────────────────────────────────────────────

    fn selected_in(&self, section: Section) -> Option<String> {
        if self.section == section {
            self.selected_id()
        } else {
            None
        }
    }

    /// Human name for an id: container/network name, image tag, volume name.
    pub fn display_name(&self, kind: ResourceType, id: &str) -> String {
        let name = match kind {
            ResourceType::Container => self.containers.get(id).map(|c| c.name.clone()),
            ResourceType::Image => self.images.get(id).and_then(|i| i.repo_tag()),
            ResourceType::Network => self.networks.get(id).map(|n| n.name.clone()),
            ResourceType::Volume => self.volumes.get(id).map(|v| v.id().to_string()),
        };
        name.filter(|n| !n.is_empty())
            .unwrap_or_else(|| short_id(id).to_string())
    }

    fn open_in_background<F>(&mut self, title: String, fetch: F)
    where
        F: FnOnce(&dyn crate::docker::DockerClient) -> crate::docker::Result<Overlay>
            + Send
            + 'static,
    {
        if self.overlay_rx.is_some() {
            return;
        }
        self.overlay = Some(Overlay::Loading { title });
        self.overlay_scroll = 0;

        let client = Arc::clone(&self.client);
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(fetch(client.as_ref()).map_err(|e| e.summary()));
        });
        self.overlay_rx = Some(rx);
    }
}
