//! Static backdrop: skyline, stars and moon.
//!
//! Laid out on a fixed virtual canvas (origin bottom-left, y up) that the
//! renderer scales to whatever the terminal offers.

pub mod city;
pub mod sky;

pub use city::{Building, City, RoofShape};
pub use sky::{Moon, Sky, Starfield};

pub const CANVAS_WIDTH: f32 = 1280.0;
pub const CANVAS_HEIGHT: f32 = 720.0;

/// Everything drawn behind the fireworks.
pub struct Scene {
    pub sky: Sky,
    pub stars: Starfield,
    pub moon: Moon,
    pub city: City,
}
