// Generic resource management: TTL cache, search/filter, background refresh and change events.

pub mod cache;
pub mod events;
pub mod list;
pub mod manager;

pub use cache::{CacheStatus, TtlCache};
pub use events::{Debouncer, Operation, ResourceEvent, Subscribers, UI_UPDATE_DELAY};
pub use list::ResourceList;
pub use manager::{Filters, Resource, ResourceKind, ResourceManager};
