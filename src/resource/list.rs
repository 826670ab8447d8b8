use std::sync::mpsc::Receiver;

use super::cache::CacheStatus;
use super::events::ResourceEvent;
use super::manager::{Filters, Resource, ResourceKind, ResourceManager};
use crate::docker::ResourceType;

/// Object-safe view of a [`ResourceManager`], so callers can drive any kind
/// without naming it.
pub trait ResourceList {
    fn kind(&self) -> ResourceType;
    fn subscribe(&mut self) -> Receiver<ResourceEvent>;
    fn refresh(&mut self, force: bool);
    fn poll(&mut self) -> usize;

    fn total(&self) -> usize;
    fn filtered_len(&self) -> usize;
    /// Id of the `index`-th item of the filtered view.
    fn id_at(&self, index: usize) -> Option<String>;
    fn contains(&self, id: &str) -> bool;

    fn search(&mut self, query: &str);
    fn clear_search(&mut self);
    fn search_query(&self) -> &str;
    fn filter(&mut self, filters: Filters);
    fn clear_filters(&mut self);
    fn filters(&self) -> &Filters;

    fn delete(&mut self, id: &str);
    fn delete_many(&mut self, ids: Vec<String>);
    fn prune(&mut self);

    fn is_loading(&self) -> bool;
    fn is_busy(&self) -> bool;
    fn is_cache_valid(&self) -> bool;
    fn invalidate_cache(&mut self);
    fn cache_status(&self) -> CacheStatus;
}

impl<K: ResourceKind> ResourceList for ResourceManager<K> {
    fn kind(&self) -> ResourceType {
        K::TYPE
    }

    fn subscribe(&mut self) -> Receiver<ResourceEvent> {
        ResourceManager::subscribe(self)
    }

    fn refresh(&mut self, force: bool) {
        ResourceManager::refresh(self, force);
    }

    fn poll(&mut self) -> usize {
        ResourceManager::poll(self)
    }

    fn total(&self) -> usize {
        self.resources().len()
    }

    fn filtered_len(&self) -> usize {
        self.filtered().len()
    }

    fn id_at(&self, index: usize) -> Option<String> {
        self.filtered().get(index).map(|r| r.id().to_string())
    }

    fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    fn search(&mut self, query: &str) {
        ResourceManager::search(self, query);
    }

    fn clear_search(&mut self) {
        ResourceManager::clear_search(self);
    }

    fn search_query(&self) -> &str {
        ResourceManager::search_query(self)
    }

    fn filter(&mut self, filters: Filters) {
        ResourceManager::filter(self, filters);
    }

    fn clear_filters(&mut self) {
        ResourceManager::clear_filters(self);
    }

    fn filters(&self) -> &Filters {
        ResourceManager::filters(self)
    }

    fn delete(&mut self, id: &str) {
        ResourceManager::delete(self, id);
    }

    fn delete_many(&mut self, ids: Vec<String>) {
        ResourceManager::delete_many(self, ids);
    }

    fn prune(&mut self) {
        ResourceManager::prune(self);
    }

    fn is_loading(&self) -> bool {
        ResourceManager::is_loading(self)
    }

    fn is_busy(&self) -> bool {
        ResourceManager::is_busy(self)
    }

    fn is_cache_valid(&self) -> bool {
        ResourceManager::is_cache_valid(self)
    }

    fn invalidate_cache(&mut self) {
        ResourceManager::invalidate_cache(self);
    }

    fn cache_status(&self) -> CacheStatus {
        ResourceManager::cache_status(self)
    }
}
