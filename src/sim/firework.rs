use std::f32::consts::PI;

use fastrand::Rng;
use glam::Vec2;
use tracing::{debug, warn};

use super::{ColorTheme, Particle, Role, uniform};
use crate::error::Result;

const CURVES_MIN: usize = 12;
const CURVES_MAX: usize = 18;
const POINTS_MIN: usize = 10;
const POINTS_MAX: usize = 15;

/// One shell: a launch particle that turns into a curved burst at its apex.
#[derive(Debug, Clone)]
pub struct Firework {
    particles: Vec<Particle>,
    launch_position: Vec2,
    exploded: bool,
    explosion_time: f32,
    theme: ColorTheme,
    curve_lengths: Vec<usize>,
    clamp_alpha: bool,
    rng: Rng,
}

impl Firework {
    /// Launches a shell with a random theme. `rng` becomes the firework's own
    /// generator for every later draw.
    pub fn new(launch_position: Vec2, mut rng: Rng) -> Result<Self> {
        let theme = ColorTheme::random(&mut rng);
        Self::with_theme(launch_position, theme, rng)
    }

    pub fn with_theme(launch_position: Vec2, theme: ColorTheme, rng: Rng) -> Result<Self> {
        let mut firework = Self {
            particles: Vec::with_capacity(1),
            launch_position,
            exploded: false,
            explosion_time: 0.0,
            theme,
            curve_lengths: Vec::new(),
            clamp_alpha: false,
            rng,
        };
        firework.launch()?;
        Ok(firework)
    }

    /// Clamp particle alpha into `[0, 1]` after every step.
    pub fn with_clamped_alpha(mut self, clamp: bool) -> Self {
        self.clamp_alpha = clamp;
        self
    }

    fn launch(&mut self) -> Result<()> {
        let color = self.theme.launch_color();
        let shell = Particle::launch(self.launch_position, color, &mut self.rng)?;
        self.particles.push(shell);
        Ok(())
    }

    /// Generates the burst around the launch particle's current position and
    /// appends it. Returns the number of fragments created.
    ///
    /// Fragments are built before any is appended, so a refused fragment
    /// leaves the collection untouched.
    fn explode(&mut self) -> Result<usize> {
        self.exploded = true;
        self.explosion_time = 0.0;

        let Some(origin) = self.particles.first().map(Particle::position) else {
            return Ok(0);
        };

        let curves = self.rng.usize(CURVES_MIN..=CURVES_MAX);
        let mut lengths = Vec::with_capacity(curves);
        let mut fragments = Vec::with_capacity(curves * POINTS_MAX);

        for curve in 0..curves {
            let base_angle = 2.0 * PI * curve as f32 / curves as f32;
            let points = self.rng.usize(POINTS_MIN..=POINTS_MAX);
            let color = self.theme.fragment_color(&mut self.rng);

            for i in 0..points {
                // 0 at both ends of the curve, 1 in the middle.
                let bow = (i as f32 / points as f32 * PI).sin();
                let angle = base_angle + bow * 0.5;
                let speed = uniform(&mut self.rng, 1.5, 3.5) * (1.0 + bow * 0.4);
                let velocity = Vec2::new(angle.cos() * speed, angle.sin() * speed);

                let (size, role) = if i == 0 || i == points - 1 {
                    (uniform(&mut self.rng, 0.25, 0.4), Role::CurveEnd)
                } else {
                    (uniform(&mut self.rng, 0.1, 0.2), Role::Fragment)
                };
                let lifetime = uniform(&mut self.rng, 1.5, 2.5);

                fragments.push(Particle::new(
                    origin,
                    velocity,
                    color,
                    lifetime,
                    size,
                    role,
                    &mut self.rng,
                )?);
            }
            lengths.push(points);
        }

        let created = fragments.len();
        self.particles.extend(fragments);
        self.curve_lengths = lengths;
        Ok(created)
    }

    /// Advances every particle, prunes the dead ones and bursts the shell
    /// once it starts to fall.
    pub fn update(&mut self, dt: f32) {
        if self.exploded {
            self.explosion_time += dt;
        }

        for particle in &mut self.particles {
            particle.advance(dt, &mut self.rng);
            if self.clamp_alpha {
                particle.clamp_alpha();
            }
        }

        self.particles.retain(Particle::is_alive);

        let falling = self
            .particles
            .first()
            .is_some_and(|shell| shell.velocity().y < 0.0);
        if !self.exploded && falling {
            match self.explode() {
                Ok(fragments) => debug!(
                    theme = %self.theme,
                    curves = self.curve_lengths.len(),
                    fragments,
                    "firework exploded"
                ),
                Err(err) => warn!(theme = %self.theme, "burst refused: {err}"),
            }
            self.particles.remove(0);
        }
    }

    /// All particles have expired; the registry drops spent fireworks.
    pub fn is_spent(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn launch_position(&self) -> Vec2 {
        self.launch_position
    }

    pub fn is_exploded(&self) -> bool {
        self.exploded
    }

    /// Seconds since the burst. Zero before it.
    pub fn explosion_time(&self) -> f32 {
        self.explosion_time
    }

    pub fn theme(&self) -> ColorTheme {
        self.theme
    }

    /// Fragments per burst curve, in generation order. Empty before the burst.
    pub fn curve_lengths(&self) -> &[usize] {
        &self.curve_lengths
    }
}
