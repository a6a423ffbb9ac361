//! Firework particle simulation.
//!
//! Everything in here is plain in-memory state stepped by a caller supplied
//! `dt`. Coordinates are simulation units (roughly one unit per 100 canvas
//! pixels); mapping to the screen is the renderer's job.

use fastrand::Rng;
use glam::Vec2;

pub mod color;
pub mod firework;
pub mod particle;
pub mod registry;
pub mod trail;

pub use color::{ColorTheme, Rgba};
pub use firework::Firework;
pub use particle::{Particle, Role, Shape};
pub use registry::Registry;
pub use trail::{Trail, TrailSample};

pub const GRAVITY: Vec2 = Vec2::new(0.0, -9.8);

/// Velocity growth factor during a fragment's expansion window.
pub const EXPANSION_BOOST: f32 = 1.2;
/// Share of gravity applied while a fragment is still expanding.
pub const EXPANSION_GRAVITY_SCALE: f32 = 0.3;
pub const DRAG_FACTOR: f32 = 0.2;
/// Fragments slower than this are not dragged.
pub const DRAG_MIN_SPEED: f32 = 0.5;

pub const LAUNCH_SPEED: f32 = 15.0;
pub const LAUNCH_LIFETIME: f32 = 2.0;
pub const LAUNCH_SIZE: f32 = 0.15;

/// Height at which launches start, matching the bottom of the visible field.
pub const GROUND_Y: f32 = -8.0;
/// Horizontal launch band used for random launches.
pub const LAUNCH_SPREAD: f32 = 5.0;

/// `lo + r * (hi - lo)` with `r` in `[0, 1)`.
pub(crate) fn uniform(rng: &mut Rng, lo: f32, hi: f32) -> f32 {
    lo + rng.f32() * (hi - lo)
}
