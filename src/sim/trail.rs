use std::collections::VecDeque;

use fastrand::Rng;
use glam::Vec2;

use super::{Rgba, uniform};

/// Seconds between trail emissions.
pub const TRAIL_INTERVAL: f32 = 0.02;
/// Seconds a sample stays visible.
pub const TRAIL_MAX_AGE: f32 = 0.7;
/// Alpha factor baked into a freshly recorded sample.
const RECORD_ALPHA: f32 = 0.85;
/// Alpha factor applied on every fade pass.
const FADE_ALPHA: f32 = 0.7;

/// Steady-state bound: one sample per interval over the sample lifetime,
/// doubled for curve ends.
pub const TRAIL_CAPACITY: usize = 2 * (TRAIL_MAX_AGE / TRAIL_INTERVAL) as usize + 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailSample {
    pub position: Vec2,
    pub color: Rgba,
    pub age: f32,
    pub max_age: f32,
    pub size: f32,
}

/// Fading streak behind a particle, oldest sample first.
#[derive(Debug, Clone)]
pub struct Trail {
    samples: VecDeque<TrailSample>,
    counter: f32,
}

impl Trail {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(TRAIL_CAPACITY),
            counter: 0.0,
        }
    }

    /// Accumulates `dt` and, once the interval is exceeded, appends `copies`
    /// samples at the particle's current state.
    pub fn record(
        &mut self,
        dt: f32,
        position: Vec2,
        color: Rgba,
        size: f32,
        copies: usize,
        rng: &mut Rng,
    ) {
        self.counter += dt;
        if self.counter <= TRAIL_INTERVAL {
            return;
        }
        self.counter = 0.0;

        let color = color.with_alpha(color.a * RECORD_ALPHA);
        for _ in 0..copies {
            self.samples.push_back(TrailSample {
                position,
                color,
                age: 0.0,
                max_age: TRAIL_MAX_AGE,
                size: size * uniform(rng, 0.6, 0.9),
            });
        }
    }

    /// Ages every sample, drops the expired ones and re-derives the alpha of
    /// the rest from the owning particle's current alpha.
    pub fn fade(&mut self, dt: f32, parent_alpha: f32) {
        self.samples.retain_mut(|sample| {
            sample.age += dt;
            if sample.age > sample.max_age {
                return false;
            }
            let remaining = 1.0 - (sample.age / sample.max_age).powf(1.5);
            sample.color.a = parent_alpha * remaining * FADE_ALPHA;
            true
        });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrailSample> + '_ {
        self.samples.iter()
    }
}
