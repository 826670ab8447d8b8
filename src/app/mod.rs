mod actions;
mod events;
mod state;
mod status;

pub use actions::{parse_filters, split_repo_tag};
pub use state::{ActivePull, App, Confirm, Dashboard, Overlay, Prompt, PromptKind, Section};
pub use status::StatusBar;
