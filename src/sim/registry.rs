use fastrand::Rng;
use glam::Vec2;
use tracing::{debug, trace, warn};

use super::{Firework, GROUND_Y, LAUNCH_SPREAD, Particle, uniform};
use crate::error::{Error, Result};

/// The set of fireworks in flight.
///
/// Owns the generator every firework's own generator is split from, so a
/// seeded registry replays identically for the same launches and `dt`s.
/// There is no admission cap here; callers that accept user input should
/// bound [`Registry::len`] themselves.
#[derive(Debug)]
pub struct Registry {
    fireworks: Vec<Firework>,
    rng: Rng,
    clamp_alpha: bool,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::from_rng(Rng::new())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(Rng::with_seed(seed))
    }

    fn from_rng(rng: Rng) -> Self {
        Self {
            fireworks: Vec::new(),
            rng,
            clamp_alpha: false,
        }
    }

    /// Clamp particle alpha into `[0, 1]` for fireworks launched from now on.
    pub fn set_clamp_alpha(&mut self, clamp: bool) {
        self.clamp_alpha = clamp;
    }

    /// Admits a new firework rising from `position`.
    pub fn launch_firework(&mut self, position: Vec2) -> Result<()> {
        if !position.is_finite() {
            return Err(Error::NonFinite { field: "launch position" });
        }
        let rng = Rng::with_seed(self.rng.u64(..));
        let firework = Firework::new(position, rng)?.with_clamped_alpha(self.clamp_alpha);
        debug!(
            x = position.x,
            y = position.y,
            theme = %firework.theme(),
            active = self.fireworks.len() + 1,
            "firework launched"
        );
        self.fireworks.push(firework);
        Ok(())
    }

    /// A launch point on the ground line, anywhere across the launch band.
    pub fn random_launch_position(&mut self) -> Vec2 {
        Vec2::new(uniform(&mut self.rng, -LAUNCH_SPREAD, LAUNCH_SPREAD), GROUND_Y)
    }

    /// Steps every firework by `dt` seconds and drops the spent ones.
    ///
    /// `dt` must be finite and non-negative; anything else is ignored.
    pub fn advance_all(&mut self, dt: f32) {
        if !(dt.is_finite() && dt >= 0.0) {
            warn!(dt, "ignoring invalid time step");
            return;
        }

        for firework in &mut self.fireworks {
            firework.update(dt);
        }

        let before = self.fireworks.len();
        self.fireworks.retain(|firework| !firework.is_spent());
        let retired = before - self.fireworks.len();
        if retired > 0 {
            debug!(retired, active = self.fireworks.len(), "fireworks retired");
        }
        trace!(
            dt,
            fireworks = self.fireworks.len(),
            particles = self.particle_count(),
            "simulation advanced"
        );
    }

    /// Every live particle, firework by firework, in insertion order.
    pub fn active_particles(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.fireworks.iter().flat_map(|firework| firework.particles())
    }

    pub fn fireworks(&self) -> &[Firework] {
        &self.fireworks
    }

    pub fn len(&self) -> usize {
        self.fireworks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fireworks.is_empty()
    }

    pub fn particle_count(&self) -> usize {
        self.fireworks.iter().map(|firework| firework.particles().len()).sum()
    }
}
