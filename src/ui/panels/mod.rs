mod dashboard;
mod resources;
mod status;

pub use dashboard::draw_dashboard;
pub use resources::draw_resources;
pub use status::{draw_notifications, draw_prompt, draw_status_bar};
