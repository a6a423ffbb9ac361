use fastrand::Rng;
use glam::Vec2;

use super::trail::Trail;
use super::{
    DRAG_FACTOR, DRAG_MIN_SPEED, EXPANSION_BOOST, EXPANSION_GRAVITY_SCALE, GRAVITY,
    LAUNCH_LIFETIME, LAUNCH_SIZE, LAUNCH_SPEED, Rgba, uniform,
};
use crate::error::{Error, Result};

/// Fraction of the lifetime a fragment stays fully opaque.
const FADE_START: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Circle,
    Square,
}

/// What a particle is within its firework. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The single rising shell.
    Launch,
    /// An interior burst fragment.
    Fragment,
    /// First or last fragment of a curve; drawn larger and pulsing.
    CurveEnd,
}

/// One point-like emitter.
#[derive(Debug, Clone)]
pub struct Particle {
    position: Vec2,
    velocity: Vec2,
    color: Rgba,
    lifetime: f32,
    age: f32,

    initial_size: f32,
    size: f32,
    shape: Shape,
    rotation: f32,
    rotation_speed: f32,

    role: Role,
    expansion_phase: bool,
    expansion_time: f32,
    peak_time: Option<f32>,
    fall_fade_speed: f32,

    trail: Trail,
}

impl Particle {
    /// Builds a particle, refusing inputs that would poison the update loop.
    pub fn new(
        position: Vec2,
        velocity: Vec2,
        color: Rgba,
        lifetime: f32,
        size: f32,
        role: Role,
        rng: &mut Rng,
    ) -> Result<Self> {
        if !position.is_finite() {
            return Err(Error::NonFinite { field: "position" });
        }
        if !velocity.is_finite() {
            return Err(Error::NonFinite { field: "velocity" });
        }
        if !color.is_finite() {
            return Err(Error::NonFinite { field: "color" });
        }
        if !(lifetime.is_finite() && lifetime > 0.0) {
            return Err(Error::InvalidLifetime(lifetime));
        }
        if !(size.is_finite() && size >= 0.0) {
            return Err(Error::InvalidSize(size));
        }

        let shape = if rng.bool() { Shape::Circle } else { Shape::Square };
        Ok(Self {
            position,
            velocity,
            color,
            lifetime,
            age: 0.0,
            initial_size: size,
            size,
            shape,
            rotation: 0.0,
            rotation_speed: uniform(rng, -180.0, 180.0),
            role,
            expansion_phase: true,
            expansion_time: uniform(rng, 0.2, 0.5),
            peak_time: None,
            fall_fade_speed: uniform(rng, 0.5, 1.5),
            trail: Trail::new(),
        })
    }

    /// The rising shell: straight up at [`LAUNCH_SPEED`].
    pub fn launch(position: Vec2, color: Rgba, rng: &mut Rng) -> Result<Self> {
        Self::new(
            position,
            Vec2::new(0.0, LAUNCH_SPEED),
            color,
            LAUNCH_LIFETIME,
            LAUNCH_SIZE,
            Role::Launch,
            rng,
        )
    }

    /// Steps the particle forward by `dt` seconds. Call exactly once per frame.
    pub fn advance(&mut self, dt: f32, rng: &mut Rng) {
        let launch = self.is_launch();

        if !launch && self.peak_time.is_none() && self.velocity.y < 0.0 {
            self.peak_time = Some(self.age);
        }

        if !launch && self.expansion_phase && self.age < self.expansion_time {
            self.velocity *= 1.0 + 0.1 * dt * EXPANSION_BOOST;
            self.velocity += GRAVITY * dt * EXPANSION_GRAVITY_SCALE;
        } else {
            self.expansion_phase = false;
            if !launch {
                let speed = self.velocity.length();
                if speed > DRAG_MIN_SPEED {
                    self.velocity *= 1.0 - DRAG_FACTOR * speed * dt;
                }
            }
            self.velocity += GRAVITY * dt;
        }

        self.position += self.velocity * dt;

        let copies = if self.is_curve_end() { 2 } else { 1 };
        self.trail
            .record(dt, self.position, self.color, self.size, copies, rng);
        self.trail.fade(dt, self.color.a);

        self.age += dt;
        let age_ratio = self.age / self.lifetime;
        self.color.a = self.faded_alpha(age_ratio);
        self.size = self.current_size(age_ratio);

        if !launch {
            self.rotation += self.rotation_speed * dt;
        }
    }

    fn faded_alpha(&self, age_ratio: f32) -> f32 {
        if self.is_launch() {
            return 1.0 - age_ratio;
        }

        let base = if age_ratio < FADE_START {
            1.0
        } else {
            1.0 - (age_ratio - FADE_START) / (1.0 - FADE_START)
        };

        match self.peak_time {
            None => base,
            Some(peak_time) => {
                let since_peak = self.age - peak_time;
                let fall_fade = (self.velocity.y.abs() / 5.0).min(1.0) * self.fall_fade_speed;
                let fade_multiplier = (1.0 - since_peak * fall_fade).max(0.0);
                let height_factor = ((self.position.y + 8.0) / 10.0).clamp(0.0, 1.0);
                base * fade_multiplier * height_factor
            }
        }
    }

    fn current_size(&self, age_ratio: f32) -> f32 {
        match self.role {
            Role::Launch => {
                let vel_ratio = self.velocity.y.abs() / LAUNCH_SPEED;
                self.initial_size * (1.0 + 2.0 * (1.0 - vel_ratio))
            }
            Role::CurveEnd => self.initial_size * (0.7 + 0.2 * (self.age * 8.0).sin()),
            Role::Fragment if self.expansion_phase && self.age < self.expansion_time => {
                self.initial_size * (1.0 + 0.5 * self.age / self.expansion_time)
            }
            Role::Fragment => self.initial_size * (1.0 - 0.5 * age_ratio),
        }
    }

    pub(crate) fn clamp_alpha(&mut self) {
        self.color.a = self.color.a.clamp(0.0, 1.0);
    }

    pub fn is_alive(&self) -> bool {
        self.age < self.lifetime
    }

    pub fn is_launch(&self) -> bool {
        self.role == Role::Launch
    }

    pub fn is_curve_end(&self) -> bool {
        self.role == Role::CurveEnd
    }

    pub fn has_peaked(&self) -> bool {
        self.peak_time.is_some()
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn age(&self) -> f32 {
        self.age
    }

    pub fn lifetime(&self) -> f32 {
        self.lifetime
    }

    pub fn peak_time(&self) -> Option<f32> {
        self.peak_time
    }

    pub fn expansion_time(&self) -> f32 {
        self.expansion_time
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn fragment(velocity: Vec2, size: f32, role: Role, rng: &mut Rng) -> Particle {
        Particle::new(
            Vec2::new(0.0, 2.0),
            velocity,
            Rgba::opaque(1.0, 0.5, 0.0),
            2.0,
            size,
            role,
            rng,
        )
        .unwrap()
    }

    #[test]
    fn rejects_bad_construction_inputs() {
        let mut rng = Rng::with_seed(1);
        let c = Rgba::opaque(1.0, 1.0, 1.0);
        let mut build = |position: Vec2, lifetime: f32, size: f32| {
            Particle::new(position, Vec2::ZERO, c, lifetime, size, Role::Fragment, &mut rng)
        };

        let bad_lifetime = build(Vec2::ZERO, 0.0, 0.1);
        assert!(matches!(bad_lifetime, Err(Error::InvalidLifetime(_))));

        let nan_pos = build(Vec2::new(f32::NAN, 0.0), 1.0, 0.1);
        assert!(matches!(nan_pos, Err(Error::NonFinite { field: "position" })));

        let neg_size = build(Vec2::ZERO, 1.0, -0.1);
        assert!(matches!(neg_size, Err(Error::InvalidSize(_))));
    }

    #[test]
    fn launch_particle_ignores_expansion_and_drag() {
        let mut rng = Rng::with_seed(2);
        let yellow = Rgba::opaque(1.0, 1.0, 0.0);
        let mut p = Particle::launch(Vec2::new(0.0, -8.0), yellow, &mut rng).unwrap();
        p.advance(0.1, &mut rng);

        assert!((p.velocity().y - (15.0 - 0.98)).abs() < 1e-5);
        assert!((p.position().y - (-8.0 + 0.1 * (15.0 - 0.98))).abs() < 1e-5);
        assert!((p.color().a - 0.95).abs() < 1e-6);
        assert_eq!(p.rotation(), 0.0);
        assert!(!p.has_peaked());
    }

    #[test]
    fn launch_particle_swells_toward_apex() {
        let mut rng = Rng::with_seed(3);
        let mut p = Particle::launch(Vec2::ZERO, Rgba::opaque(1.0, 1.0, 1.0), &mut rng).unwrap();
        let mut last = p.size();
        while p.velocity().y > 0.5 {
            p.advance(DT, &mut rng);
            assert!(p.size() >= last);
            last = p.size();
        }
        assert!(p.size() > 2.8 * LAUNCH_SIZE);
        assert!(p.size() <= 3.0 * LAUNCH_SIZE + 1e-6);
    }

    #[test]
    fn expansion_boosts_velocity_with_reduced_gravity() {
        let mut rng = Rng::with_seed(4);
        let mut p = fragment(Vec2::new(2.0, 0.0), 0.15, Role::Fragment, &mut rng);
        p.advance(0.01, &mut rng);

        let scale = 1.0 + 0.1 * 0.01 * 1.2;
        assert!((p.velocity().x - 2.0 * scale).abs() < 1e-6);
        assert!((p.velocity().y - (-9.8 * 0.01 * 0.3)).abs() < 1e-6);
    }

    #[test]
    fn drag_uses_pre_drag_speed() {
        let mut rng = Rng::with_seed(5);
        let mut p = fragment(Vec2::new(3.0, 4.0), 0.15, Role::Fragment, &mut rng);
        while p.age() < p.expansion_time() {
            p.advance(0.05, &mut rng);
        }
        let v = p.velocity();
        let speed = v.length();
        p.advance(0.05, &mut rng);

        let expected = v * (1.0 - 0.2 * speed * 0.05) + GRAVITY * 0.05;
        assert!((p.velocity() - expected).length() < 1e-5);
    }

    #[test]
    fn peak_is_recorded_once_on_first_downward_frame() {
        let mut rng = Rng::with_seed(6);
        let mut p = fragment(Vec2::new(0.5, 2.0), 0.15, Role::Fragment, &mut rng);

        let mut peak = None;
        while p.is_alive() {
            let was_falling = p.velocity().y < 0.0;
            let age_before = p.age();
            p.advance(DT, &mut rng);
            match (peak, p.peak_time()) {
                (None, Some(t)) => {
                    assert!(was_falling);
                    assert_eq!(t, age_before);
                    peak = Some(t);
                }
                (Some(t), now) => assert_eq!(now, Some(t)),
                (None, None) => assert!(!was_falling),
            }
        }
        assert!(peak.is_some());
    }

    #[test]
    fn unpeaked_fragment_holds_alpha_then_fades_linearly() {
        let mut rng = Rng::with_seed(7);
        // Peak detection runs before integration, so two coarse steps from a
        // steep start never observe a downward velocity.
        let mut p = fragment(Vec2::new(1.0, 50.0), 0.15, Role::Fragment, &mut rng);
        p.advance(0.5, &mut rng);
        assert_eq!(p.color().a, 1.0);

        p.advance(0.9, &mut rng);
        assert!(!p.has_peaked());
        // age 1.4 of 2.0 -> ratio 0.7 -> 1 - 0.1/0.4
        assert!((p.color().a - 0.75).abs() < 1e-5);
    }

    fn falling(lifetime: f32, rng: &mut Rng) -> Particle {
        let c = Rgba::opaque(0.2, 0.4, 1.0);
        let (position, velocity) = (Vec2::new(0.0, -2.0), Vec2::new(0.0, -3.0));
        Particle::new(position, velocity, c, lifetime, 0.15, Role::Fragment, rng).unwrap()
    }

    // Both fall factors read from the state after the step.
    fn fall_factors(p: &Particle) -> (f32, f32) {
        let since_peak = p.age - p.peak_time.unwrap();
        let fall_fade = (p.velocity.y.abs() / 5.0).min(1.0) * p.fall_fade_speed;
        let fade_multiplier = (1.0 - since_peak * fall_fade).max(0.0);
        let height_factor = ((p.position.y + 8.0) / 10.0).clamp(0.0, 1.0);
        (fade_multiplier, height_factor)
    }

    #[test]
    fn falling_fragment_alpha_combines_fall_fade_and_height() {
        let mut rng = Rng::with_seed(21);
        let mut p = falling(4.0, &mut rng);
        p.advance(0.1, &mut rng);
        p.advance(0.1, &mut rng);

        assert_eq!(p.peak_time, Some(0.0));
        assert!(p.age / p.lifetime < FADE_START);
        let (fm, hf) = fall_factors(&p);
        assert!(fm > 0.0 && fm < 1.0, "fade multiplier {fm}");
        assert!(hf > 0.0 && hf < 1.0, "height factor {hf}");
        assert!((p.color().a - fm * hf).abs() < 1e-6);
    }

    #[test]
    fn late_falling_fragment_multiplies_ramp_with_fall_factors() {
        let mut rng = Rng::with_seed(22);
        let mut p = falling(0.3, &mut rng);
        p.advance(0.1, &mut rng);
        p.advance(0.1, &mut rng);

        let ratio = p.age / p.lifetime;
        assert!(ratio > FADE_START && ratio < 1.0);
        let base = 1.0 - (ratio - FADE_START) / (1.0 - FADE_START);
        assert!(base > 0.0 && base < 1.0);
        let (fm, hf) = fall_factors(&p);
        assert!(fm > 0.0 && fm < 1.0 && hf > 0.0 && hf < 1.0);
        assert!((p.color().a - base * fm * hf).abs() < 1e-6);
    }

    #[test]
    fn fragments_near_the_ground_vanish() {
        let mut rng = Rng::with_seed(8);
        let mut p = Particle::new(
            Vec2::new(0.0, -7.0),
            Vec2::new(0.0, -0.1),
            Rgba::opaque(1.0, 1.0, 1.0),
            5.0,
            0.15,
            Role::Fragment,
            &mut rng,
        )
        .unwrap();
        for _ in 0..120 {
            p.advance(DT, &mut rng);
        }
        assert!(p.has_peaked());
        assert!(p.position().y < -8.0);
        assert_eq!(p.color().a, 0.0);
    }

    #[test]
    fn fragment_shrinks_to_half_at_end_of_life() {
        let mut rng = Rng::with_seed(9);
        let mut p = fragment(Vec2::new(1.0, 1.0), 0.2, Role::Fragment, &mut rng);
        p.advance(1.0, &mut rng);
        p.advance(1.0, &mut rng);
        assert!(!p.is_alive());
        assert!((p.size() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn expanding_fragment_grows() {
        let mut rng = Rng::with_seed(10);
        let mut p = fragment(Vec2::new(1.0, 1.0), 0.2, Role::Fragment, &mut rng);
        p.advance(0.1, &mut rng);
        let expected = 0.2 * (1.0 + 0.5 * 0.1 / p.expansion_time());
        assert!((p.size() - expected).abs() < 1e-6);
    }

    #[test]
    fn curve_end_pulses_and_rotates() {
        let mut rng = Rng::with_seed(11);
        let mut p = fragment(Vec2::new(1.0, 1.0), 0.3, Role::CurveEnd, &mut rng);
        p.advance(0.1, &mut rng);
        let expected = 0.3 * (0.7 + 0.2 * (0.1f32 * 8.0).sin());
        assert!((p.size() - expected).abs() < 1e-6);
        assert!(p.rotation() != 0.0 || p.rotation_speed == 0.0);
    }

    #[test]
    fn age_is_monotonic_and_death_is_inclusive() {
        let mut rng = Rng::with_seed(12);
        let mut p = fragment(Vec2::new(1.0, 1.0), 0.2, Role::Fragment, &mut rng);
        p.advance(1.5, &mut rng);
        assert!(p.is_alive());
        p.advance(0.5, &mut rng);
        assert_eq!(p.age(), 2.0);
        assert!(!p.is_alive());
    }
}
