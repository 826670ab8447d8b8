use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::cache::{CacheStatus, TtlCache};
use super::events::{Debouncer, Operation, ResourceEvent, Subscribers};
use crate::docker::{self, DockerClient, ResourceType};

/// Active filter criteria, keyed by field name. Empty values are ignored.
pub type Filters = BTreeMap<String, String>;

/// A listable Docker entity.
pub trait Resource: Clone + Send + 'static {
    /// Identifier passed back to the daemon for operations on this item.
    fn id(&self) -> &str;

    /// Whether the item matches a search query (already lowercased).
    fn matches_search(&self, query: &str) -> bool;

    /// Whether the item passes one filter. `value` is lowercased and
    /// non-empty; unknown keys must return `true`.
    fn matches_filter(&self, key: &str, value: &str) -> bool;
}

/// Binds a [`Resource`] type to the client calls that load and delete it.
pub trait ResourceKind: Send + 'static {
    type Item: Resource;

    const TYPE: ResourceType;

    /// Cache lifetime used when the configuration doesn't override it.
    const DEFAULT_TTL: Duration;

    fn load(client: &dyn DockerClient) -> docker::Result<Vec<Self::Item>>;

    fn delete(client: &dyn DockerClient, id: &str) -> docker::Result<()> {
        client.remove(Self::TYPE, id, true)
    }
}

enum Completion<T> {
    Loaded(Result<Vec<T>, String>),
    Deleted {
        id: String,
        result: Result<(), String>,
    },
    Progress {
        op: Operation,
        line: String,
    },
    Operation {
        op: Operation,
        target: String,
        result: Result<String, String>,
    },
}

/// Cached, searchable, filterable list of one resource kind.
///
/// All daemon calls run on background threads. Their results are queued and
/// applied on the owning (UI) thread by [`poll`](Self::poll), which is also
/// where subscribers are notified.
pub struct ResourceManager<K: ResourceKind> {
    client: Arc<dyn DockerClient>,
    resources: Vec<K::Item>,
    filtered: Vec<K::Item>,
    search: String,
    filters: Filters,
    loading: bool,
    refresh_queued: bool,
    in_flight: usize,
    cache: TtlCache,
    subscribers: Subscribers,
    debouncer: Debouncer,
    tx: Sender<Completion<K::Item>>,
    rx: Receiver<Completion<K::Item>>,
}

impl<K: ResourceKind> ResourceManager<K> {
    pub fn new(client: Arc<dyn DockerClient>, ttl: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            client,
            resources: Vec::new(),
            filtered: Vec::new(),
            search: String::new(),
            filters: Filters::new(),
            loading: false,
            refresh_queued: false,
            in_flight: 0,
            cache: TtlCache::new(ttl),
            subscribers: Subscribers::default(),
            debouncer: Debouncer::default(),
            tx,
            rx,
        }
    }

    pub fn with_default_ttl(client: Arc<dyn DockerClient>) -> Self {
        Self::new(client, K::DEFAULT_TTL)
    }

    pub fn kind(&self) -> ResourceType {
        K::TYPE
    }

    pub fn client(&self) -> &Arc<dyn DockerClient> {
        &self.client
    }

    /// Register for change notifications. Drop the receiver to unsubscribe.
    pub fn subscribe(&mut self) -> Receiver<ResourceEvent> {
        self.subscribers.subscribe()
    }

    // ── Cache ─────────────────────────────────────────────────────────

    pub fn is_cache_valid(&self) -> bool {
        self.cache.is_valid_at(Instant::now())
    }

    pub fn invalidate_cache(&mut self) {
        self.cache.invalidate();
    }

    pub fn cache_status(&self) -> CacheStatus {
        self.cache.status_at(Instant::now())
    }

    // ── Loading ───────────────────────────────────────────────────────

    /// Reload from the daemon unless the cache is still valid.
    pub fn refresh(&mut self, force: bool) {
        self.refresh_at(force, Instant::now());
    }

    pub fn refresh_at(&mut self, force: bool, now: Instant) {
        if self.loading {
            // A forced refresh requested mid-load must not be lost: the
            // in-flight listing may predate the change that prompted it.
            self.refresh_queued |= force;
            return;
        }

        if !force && self.cache.is_valid_at(now) {
            self.subscribers.notify(ResourceEvent::CacheHit(K::TYPE));
            return;
        }

        debug!(kind = %K::TYPE, force, "refreshing");
        self.loading = true;
        self.subscribers
            .notify(ResourceEvent::LoadingStarted(K::TYPE));

        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let result = K::load(client.as_ref()).map_err(|e| e.summary());
            let _ = tx.send(Completion::Loaded(result));
        });
    }

    /// Apply finished background work and fire a due `UiUpdate`.
    ///
    /// Returns the number of events processed; call it once per UI tick.
    pub fn poll(&mut self) -> usize {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&mut self, now: Instant) -> usize {
        let mut handled = 0;

        while let Ok(completion) = self.rx.try_recv() {
            handled += 1;
            match completion {
                Completion::Loaded(Ok(items)) => {
                    self.loading = false;
                    debug!(kind = %K::TYPE, count = items.len(), "loaded");
                    self.resources = items;
                    self.cache.mark_fresh(now);
                    self.apply_filters_and_search();
                    self.subscribers
                        .notify(ResourceEvent::LoadingComplete(K::TYPE));
                    self.debouncer.schedule(now);
                }
                Completion::Loaded(Err(error)) => {
                    self.loading = false;
                    warn!(kind = %K::TYPE, %error, "refresh failed");
                    self.subscribers.notify(ResourceEvent::LoadingError {
                        kind: K::TYPE,
                        error,
                    });
                }
                Completion::Deleted { id, result } => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    match result {
                        Ok(()) => {
                            info!(kind = %K::TYPE, %id, "deleted");
                            self.cache.invalidate();
                            self.subscribers.notify(ResourceEvent::DeleteComplete {
                                kind: K::TYPE,
                                id,
                            });
                            self.refresh_at(true, now);
                        }
                        Err(error) => {
                            warn!(kind = %K::TYPE, %id, %error, "delete failed");
                            self.subscribers.notify(ResourceEvent::DeleteError {
                                kind: K::TYPE,
                                id,
                                error,
                            });
                        }
                    }
                }
                Completion::Progress { op, line } => {
                    self.subscribers.notify(ResourceEvent::Progress {
                        kind: K::TYPE,
                        op,
                        line,
                    });
                }
                Completion::Operation { op, target, result } => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    // Even a failed operation may have changed state (e.g. a
                    // batch that partly succeeded), so always re-list.
                    self.cache.invalidate();
                    match result {
                        Ok(message) => {
                            info!(kind = %K::TYPE, %op, %target, "operation complete");
                            self.subscribers.notify(ResourceEvent::OperationComplete {
                                kind: K::TYPE,
                                op,
                                target,
                                message,
                            });
                        }
                        Err(error) => {
                            warn!(kind = %K::TYPE, %op, %target, %error, "operation failed");
                            self.subscribers.notify(ResourceEvent::OperationError {
                                kind: K::TYPE,
                                op,
                                target,
                                error,
                            });
                        }
                    }
                    self.refresh_at(true, now);
                }
            }
        }

        if !self.loading && self.refresh_queued {
            self.refresh_queued = false;
            self.refresh_at(true, now);
        }

        if self.debouncer.fire_due(now) {
            handled += 1;
            self.subscribers.notify(ResourceEvent::UiUpdate(K::TYPE));
        }

        handled
    }

    // ── Search / filter ───────────────────────────────────────────────

    pub fn search(&mut self, query: &str) {
        self.search = query.to_string();
        self.criteria_changed();
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
        self.criteria_changed();
    }

    pub fn filter(&mut self, filters: Filters) {
        self.filters = filters;
        self.criteria_changed();
    }

    pub fn set_filter(&mut self, key: &str, value: &str) {
        self.filters.insert(key.to_string(), value.to_string());
        self.criteria_changed();
    }

    pub fn remove_filter(&mut self, key: &str) {
        if self.filters.remove(key).is_some() {
            self.criteria_changed();
        }
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.criteria_changed();
    }

    pub fn search_query(&self) -> &str {
        &self.search
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    fn criteria_changed(&mut self) {
        self.apply_filters_and_search();
        self.debouncer.schedule(Instant::now());
    }

    fn apply_filters_and_search(&mut self) {
        let query = self.search.trim().to_lowercase();
        let active: Vec<(&str, String)> = self
            .filters
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| (k.as_str(), v.trim().to_lowercase()))
            .collect();

        self.filtered = self
            .resources
            .iter()
            .filter(|r| query.is_empty() || r.matches_search(&query))
            .filter(|r| active.iter().all(|(k, v)| r.matches_filter(k, v)))
            .cloned()
            .collect();
    }

    // ── Accessors ─────────────────────────────────────────────────────

    pub fn get(&self, id: &str) -> Option<&K::Item> {
        self.resources.iter().find(|r| r.id() == id)
    }

    pub fn resources(&self) -> &[K::Item] {
        &self.resources
    }

    pub fn filtered(&self) -> &[K::Item] {
        &self.filtered
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Loading, or at least one operation still running.
    pub fn is_busy(&self) -> bool {
        self.loading || self.in_flight > 0
    }

    pub fn count(&self, pred: impl Fn(&K::Item) -> bool) -> usize {
        self.resources.iter().filter(|r| pred(r)).count()
    }

    // ── Operations ────────────────────────────────────────────────────

    /// Delete one item in the background, then force a refresh.
    pub fn delete(&mut self, id: &str) {
        let id = id.to_string();
        self.in_flight += 1;
        info!(kind = %K::TYPE, %id, "deleting");

        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let result = K::delete(client.as_ref(), &id).map_err(|e| e.summary());
            let _ = tx.send(Completion::Deleted { id, result });
        });
    }

    /// Run `job` against the client on a background thread.
    ///
    /// The job receives a sink for progress lines and returns the
    /// user-facing completion message.
    pub fn run_operation<F>(&mut self, op: Operation, target: impl Into<String>, job: F)
    where
        F: FnOnce(&dyn DockerClient, &mut dyn FnMut(&str)) -> docker::Result<String>
            + Send
            + 'static,
    {
        let target = target.into();
        self.in_flight += 1;
        info!(kind = %K::TYPE, %op, %target, "starting operation");
        self.subscribers.notify(ResourceEvent::OperationStarted {
            kind: K::TYPE,
            op,
            target: target.clone(),
        });

        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let progress = tx.clone();
            let mut on_line = |line: &str| {
                let _ = progress.send(Completion::Progress {
                    op,
                    line: line.to_string(),
                });
            };
            let result = job(client.as_ref(), &mut on_line).map_err(|e| e.summary());
            let _ = tx.send(Completion::Operation { op, target, result });
        });
    }

    /// Remove several items, aggregating per-item failures.
    pub fn delete_many(&mut self, ids: Vec<String>) {
        let target = format!("{} {}", ids.len(), K::TYPE.plural());
        self.run_operation(Operation::DeleteMany, target, move |client, _| {
            let outcome = client.remove_many(K::TYPE, &ids, true);
            let message = outcome.describe(K::TYPE);
            if outcome.is_complete_success() {
                Ok(message)
            } else {
                Err(docker::DockerError::CommandFailed {
                    command: format!("{} rm", K::TYPE.noun()),
                    code: None,
                    stderr: message,
                })
            }
        });
    }

    /// Delete every unused item of this kind.
    pub fn prune(&mut self) {
        self.run_operation(Operation::Prune, K::TYPE.plural(), |client, _| {
            let report = client.prune(K::TYPE)?;
            Ok(format!(
                "removed {} unused {}, reclaimed {}",
                report.deleted.len(),
                K::TYPE.plural(),
                crate::format::format_size(report.reclaimed_bytes)
            ))
        });
    }
}
