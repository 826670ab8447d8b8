mod loader;
mod types;

pub use loader::{LOCAL_FILE, discover, load, load_file};
pub use types::{CacheTtl, Config, CustomTheme, Interval};
