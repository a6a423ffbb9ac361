//! Rasterises the scene and the live particles into a half-block terminal
//! frame.

mod frame;
mod viewport;

pub use frame::Frame;
pub use viewport::Viewport;
