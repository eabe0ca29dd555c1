pub mod animation;
pub mod brightness;
pub mod font;
mod renderer;
pub mod tileset;
mod ui;

pub use brightness::{adjust_brightness, depth_brightness_delta};
pub use font::BitmapFont;
pub use renderer::Renderer;
