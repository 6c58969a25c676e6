// MODEL: Camera, render parameters and frame timing
pub mod camera;
pub mod params;
pub mod timing;

pub use camera::{Camera, CameraBasis};
pub use params::RenderParams;
pub use timing::{FpsCounter, FrameClock};
