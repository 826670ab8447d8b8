use std::time::Instant;

use tracing::{debug, warn};

use crate::docker::ResourceType;
use crate::format::short_id;
use crate::resource::{Operation, ResourceEvent};

use super::actions::SYSTEM_TARGET;
use super::state::{App, Overlay, Section};

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl App {
    /// One UI tick: apply background results, route manager events, expire
    /// notifications and fire auto-refresh.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    pub fn tick_at(&mut self, now: Instant) {
        for kind in ResourceType::ALL {
            self.manager_mut(kind).poll();
        }
        self.drain_events();
        self.drain_background();
        self.notifications.expire(now);

        if let Some(period) = self.auto_refresh
            && now.saturating_duration_since(self.last_auto_refresh) >= period
        {
            self.last_auto_refresh = now;
            // Not forced: an unexpired cache answers without a daemon call.
            self.refresh_current(false);
        }
    }

    fn drain_events(&mut self) {
        let mut pending = Vec::new();
        for rx in &self.events {
            pending.extend(rx.try_iter());
        }
        for event in pending {
            self.handle_event(event);
        }
    }

    fn drain_background(&mut self) {
        if let Some(rx) = &self.dashboard_rx
            && let Ok(data) = rx.try_recv()
        {
            self.dashboard_rx = None;
            match (&data.version, &data.error) {
                (Some(version), _) => self.status.set_docker_status(true, Some(version)),
                (None, Some(error)) => {
                    self.status.set_docker_status(false, Some("unavailable"));
                    self.status.show_error(error.clone());
                }
                (None, None) => self.status.set_docker_status(false, None),
            }
            self.dashboard = data;
        }

        if let Some(rx) = &self.overlay_rx
            && let Ok(result) = rx.try_recv()
        {
            self.overlay_rx = None;
            match result {
                Ok(overlay) => {
                    // The user may have closed the loading popup meanwhile.
                    if matches!(self.overlay, Some(Overlay::Loading { .. })) {
                        self.overlay = Some(overlay);
                    }
                }
                Err(error) => {
                    if matches!(self.overlay, Some(Overlay::Loading { .. })) {
                        self.overlay = None;
                    }
                    self.notifications.error(error);
                }
            }
        }
    }

    /// Route a manager event into the status bar and notifications.
    pub fn handle_event(&mut self, event: ResourceEvent) {
        debug!(?event, "resource event");
        match event {
            ResourceEvent::CacheHit(_) => {}
            ResourceEvent::LoadingStarted(kind) => {
                self.status
                    .show_loading(format!("Loading {}…", kind.plural()));
            }
            ResourceEvent::LoadingComplete(kind) => {
                let total = self.manager(kind).total();
                self.status.set_docker_status(
                    true,
                    self.dashboard.version.as_deref(),
                );
                self.status
                    .hide_loading(format!("{total} {} loaded", kind.plural()));
                self.prune_marks(kind);
                self.advance_load_batch();
            }
            ResourceEvent::LoadingError { kind, error } => {
                self.status.show_error(format!("Failed to load {}", kind.plural()));
                self.notifications
                    .error(format!("Failed to load {}: {error}", kind.plural()));
                self.advance_load_batch();
            }
            ResourceEvent::DeleteComplete { kind, id } => {
                let msg = format!("{} {} deleted", capitalize(kind.noun()), short_id(&id));
                self.status.show_success(msg.clone());
                self.notifications.success(msg);
                if let Some(marks) = self.marked.get_mut(&kind) {
                    marks.remove(&id);
                }
            }
            ResourceEvent::DeleteError { kind, id, error } => {
                let msg = format!("Failed to delete {kind} {}: {error}", short_id(&id));
                self.status.show_error(msg.clone());
                self.notifications.error(msg);
            }
            ResourceEvent::OperationStarted { op, target, .. } => {
                self.status
                    .show_loading(format!("{} {target}…", capitalize(op.as_str())));
            }
            ResourceEvent::Progress { line, .. } => {
                self.status.set_progress_text(line);
            }
            ResourceEvent::OperationComplete {
                kind,
                op,
                target,
                message,
            } => {
                self.status.clear_progress();
                self.status.show_success(message.clone());
                self.notifications.success(message);
                self.finish_operation(kind, op, &target);
            }
            ResourceEvent::OperationError {
                kind,
                op,
                target,
                error,
            } => {
                warn!(%kind, %op, %target, %error, "operation failed");
                self.status.clear_progress();
                let msg = format!("{} {target} failed: {error}", capitalize(op.as_str()));
                self.status.show_error(msg.clone());
                self.notifications.error(msg);
                self.finish_operation(kind, op, &target);
            }
            ResourceEvent::UiUpdate(_) => self.clamp_indices(),
        }
    }

    fn advance_load_batch(&mut self) {
        if self.load_batch == 0 {
            return;
        }
        let remaining = self.kinds_loading();
        if remaining == 0 {
            self.load_batch = 0;
            self.status.clear_progress();
            return;
        }
        let done = self.load_batch.saturating_sub(remaining);
        self.status.set_progress(
            done as f64 / self.load_batch as f64,
            format!("{done}/{} kinds", self.load_batch),
        );
    }

    fn finish_operation(&mut self, kind: ResourceType, op: Operation, target: &str) {
        match op {
            // A cancelled pull finishing late must not clear a newer one.
            Operation::Pull => {
                if let Some(pos) = self.cancelled_pulls.iter().position(|i| i == target) {
                    self.cancelled_pulls.swap_remove(pos);
                } else if self.pull.as_ref().is_some_and(|p| p.image == target) {
                    self.pull = None;
                }
            }
            // The manager that ran the prune has already reloaded itself.
            Operation::Prune if target == SYSTEM_TARGET => {
                let others: Vec<ResourceType> = ResourceType::ALL
                    .into_iter()
                    .filter(|&other| other != kind)
                    .collect();
                for &other in &others {
                    self.manager_mut(other).invalidate_cache();
                }
                self.refresh_kinds(&others, true);
                self.load_dashboard();
            }
            // Dashboard disk usage is stale after any bulk removal.
            Operation::Prune | Operation::DeleteMany => {
                self.prune_marks(kind);
                if self.section == Section::Dashboard {
                    self.load_dashboard();
                }
            }
            _ => {}
        }
    }
}
