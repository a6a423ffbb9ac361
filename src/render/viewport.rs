use glam::Vec2;

use crate::scene::{CANVAS_HEIGHT, CANVAS_WIDTH};

/// Canvas units per simulation unit.
const SIM_SCALE: f32 = 100.0;
/// Canvas height of the simulation origin.
const SIM_ORIGIN_Y: f32 = 100.0;

/// Maps between simulation units, the virtual canvas and the terminal pixel
/// grid (one column by two half-block rows per cell, y pointing down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Pixels per canvas unit along x and y.
    pub fn scale(&self) -> (f32, f32) {
        (
            self.width as f32 / CANVAS_WIDTH,
            self.height as f32 / CANVAS_HEIGHT,
        )
    }

    pub fn sim_to_canvas(&self, p: Vec2) -> (f32, f32) {
        (p.x * SIM_SCALE + CANVAS_WIDTH / 2.0, p.y * SIM_SCALE + SIM_ORIGIN_Y)
    }

    pub fn canvas_to_pixel(&self, x: f32, y: f32) -> (f32, f32) {
        let (sx, sy) = self.scale();
        (x * sx, (CANVAS_HEIGHT - y) * sy)
    }

    /// Canvas point at the centre of pixel `(px, py)`.
    pub fn pixel_to_canvas(&self, px: usize, py: usize) -> (f32, f32) {
        let (sx, sy) = self.scale();
        (
            (px as f32 + 0.5) / sx,
            CANVAS_HEIGHT - (py as f32 + 0.5) / sy,
        )
    }

    pub fn sim_to_pixel(&self, p: Vec2) -> (f32, f32) {
        let (x, y) = self.sim_to_canvas(p);
        self.canvas_to_pixel(x, y)
    }

    /// Simulation x under a terminal column, for click-to-launch.
    pub fn column_to_sim_x(&self, column: u16) -> f32 {
        let (x, _) = self.pixel_to_canvas(column as usize, 0);
        (x - CANVAS_WIDTH / 2.0) / SIM_SCALE
    }
}
