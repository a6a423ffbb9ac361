use fastrand::Rng;
use noise::{NoiseFn, Perlin};

use super::{CANVAS_HEIGHT, CANVAS_WIDTH};

pub type Rgb = [f32; 3];

/// Vertical gradient behind everything else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sky {
    pub bottom: Rgb,
    pub top: Rgb,
}

impl Default for Sky {
    fn default() -> Self {
        Self {
            bottom: [0.0, 0.0, 0.1],
            top: [0.0, 0.1, 0.2],
        }
    }
}

impl Sky {
    pub fn with_bottom(bottom: Rgb) -> Self {
        Self {
            bottom,
            ..Self::default()
        }
    }

    pub fn color_at(&self, y: f32) -> Rgb {
        let t = (y / CANVAS_HEIGHT).clamp(0.0, 1.0);
        [
            self.bottom[0] + (self.top[0] - self.bottom[0]) * t,
            self.bottom[1] + (self.top[1] - self.bottom[1]) * t,
            self.bottom[2] + (self.top[2] - self.bottom[2]) * t,
        ]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Star {
    pub x: f32,
    pub y: f32,
}

/// White points scattered over the upper half of the canvas.
pub struct Starfield {
    stars: Vec<Star>,
    noise: Perlin,
    time: f64,
}

impl Starfield {
    pub fn generate(count: usize, seed: u64) -> Self {
        let mut rng = Rng::with_seed(seed);
        let (w, h) = (CANVAS_WIDTH as u32, CANVAS_HEIGHT as u32);
        let stars = (0..count)
            .map(|_| Star {
                x: rng.u32(0..=w) as f32,
                y: rng.u32(h / 2..=h) as f32,
            })
            .collect();
        Self {
            stars,
            noise: Perlin::new(rng.u32(..)),
            time: 0.0,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.time += dt as f64;
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    /// Stars with their current twinkle brightness in `[0.35, 1]`.
    pub fn twinkling(&self) -> impl Iterator<Item = (Star, f32)> + '_ {
        self.stars.iter().map(move |star| {
            let n = self.noise.get([
                star.x as f64 * 0.05,
                star.y as f64 * 0.05,
                self.time * 0.8,
            ]) as f32;
            (*star, (0.8 + 0.35 * n).clamp(0.35, 1.0))
        })
    }
}

pub const MOON_COLOR: Rgb = [1.0, 1.0, 0.6];
const GLOW_RINGS: u32 = 5;
const GLOW_STEP: f32 = 15.0;
pub const GLOW_ALPHA: f32 = 0.05;

/// Pale disc with a soft halo of stacked translucent rings.
pub struct Moon {
    pub center: (f32, f32),
    pub radius: f32,
    surface: Perlin,
}

impl Default for Moon {
    fn default() -> Self {
        Self {
            center: (CANVAS_WIDTH / 2.0, (CANVAS_HEIGHT * 0.65).round()),
            radius: 120.0,
            surface: Perlin::new(7),
        }
    }
}

impl Moon {
    /// How many halo rings cover a point; rings stack, so the halo brightens
    /// toward the disc.
    pub fn glow_layers(&self, x: f32, y: f32) -> u32 {
        let d = self.distance(x, y);
        (1..=GLOW_RINGS)
            .filter(|i| d <= self.radius + *i as f32 * GLOW_STEP)
            .count() as u32
    }

    pub fn covers(&self, x: f32, y: f32) -> bool {
        self.distance(x, y) <= self.radius
    }

    /// Disc colour at a point, mottled a little by noise.
    pub fn surface_color(&self, x: f32, y: f32) -> Rgb {
        let n = self.surface.get([x as f64 * 0.02, y as f64 * 0.02]) as f32;
        let shade = (0.93 + 0.07 * n).clamp(0.8, 1.0);
        [MOON_COLOR[0] * shade, MOON_COLOR[1] * shade, MOON_COLOR[2] * shade]
    }

    fn distance(&self, x: f32, y: f32) -> f32 {
        let (dx, dy) = (x - self.center.0, y - self.center.1);
        (dx * dx + dy * dy).sqrt()
    }
}
