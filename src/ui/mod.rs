mod draw;
mod overlay;
mod panels;
pub mod style;
pub mod theme;

pub use draw::draw;
pub use overlay::centered_rect;
