use super::Effect;
use crate::config::Config;
use crate::render::{Frame, Viewport};
use crate::scene::{City, Moon, Scene, Sky, Starfield};
use crate::sim::{GROUND_Y, Registry};
use crossterm::event::{Event, KeyCode, KeyEventKind, MouseButton, MouseEventKind};
use glam::Vec2;
use std::io::{BufWriter, Stdout, Write};
use tracing::{debug, info, warn};

/// Fireworks over the skyline.
///
/// Space launches from a random spot, a left click launches from the clicked
/// column and `a` toggles the screensaver-style auto launcher.
pub struct NightCityEffect {
    registry: Registry,
    scene: Scene,
    frame: Frame,
    viewport: Viewport,
    max_fireworks: usize,
    auto_launch: bool,
    interval: (f32, f32),
    time: f32,
    next_launch: f32,
    rng: fastrand::Rng,
    output_buf: Vec<u8>,
}

impl Effect for NightCityEffect {
    fn new(width: usize, height: usize, config: &Config) -> Self {
        let mut registry = match config.simulation.seed {
            Some(seed) => Registry::with_seed(seed),
            None => Registry::new(),
        };
        registry.set_clamp_alpha(config.simulation.clamp_alpha);

        let scene = Scene {
            sky: config.sky_bottom().map(Sky::with_bottom).unwrap_or_default(),
            stars: Starfield::generate(config.sky.stars, config.city.seed.wrapping_add(1)),
            moon: Moon::default(),
            city: City::generate(config.city.seed, config.city.window_chance),
        };
        let viewport = Viewport::new(width, height);
        let frame = Frame::new(viewport, &scene);
        let rng = match config.simulation.seed {
            Some(seed) => fastrand::Rng::with_seed(seed.rotate_left(17)),
            None => fastrand::Rng::new(),
        };

        debug!(
            width,
            height,
            buildings = scene.city.buildings().count(),
            "scene built"
        );

        Self {
            registry,
            scene,
            frame,
            viewport,
            max_fireworks: config.simulation.max_fireworks,
            auto_launch: config.launch.auto,
            interval: (config.launch.interval_min, config.launch.interval_max),
            time: 0.0,
            next_launch: 0.5,
            rng,
            output_buf: Vec::with_capacity(width * height * 25),
        }
    }

    fn update(&mut self, dt: f32) {
        self.time += dt;
        // Wrap time to prevent floating point precision issues
        if self.time > 10000.0 {
            self.time -= 10000.0;
            self.next_launch -= 10000.0;
        }

        if self.auto_launch && self.time >= self.next_launch {
            let at = self.registry.random_launch_position();
            self.launch(at);
            let (lo, hi) = self.interval;
            self.next_launch = self.time + lo + self.rng.f32() * (hi - lo);
        }

        self.scene.stars.update(dt);
        self.registry.advance_all(dt);
    }

    fn render(&mut self, stdout: &mut BufWriter<Stdout>) -> std::io::Result<()> {
        self.frame.begin(&self.scene.stars);
        for particle in self.registry.active_particles() {
            self.frame.draw_particle(particle);
        }

        self.output_buf.clear();
        self.frame.encode(&mut self.output_buf)?;
        stdout.write_all(&self.output_buf)?;
        stdout.flush()?;
        Ok(())
    }

    fn handle_event(&mut self, event: &Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char(' ') => {
                    let at = self.registry.random_launch_position();
                    self.launch(at);
                }
                KeyCode::Char('a') => {
                    self.auto_launch = !self.auto_launch;
                    self.next_launch = self.time;
                    info!(enabled = self.auto_launch, "auto launch toggled");
                }
                _ => {}
            },
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                let x = self.viewport.column_to_sim_x(mouse.column);
                self.launch(Vec2::new(x, GROUND_Y));
            }
            _ => {}
        }
    }
}

impl NightCityEffect {
    /// Admission guard in front of the registry, which never limits itself.
    fn launch(&mut self, at: Vec2) {
        if self.max_fireworks > 0 && self.registry.len() >= self.max_fireworks {
            debug!(active = self.registry.len(), "launch dropped, too many fireworks in flight");
            return;
        }
        if let Err(err) = self.registry.launch_firework(at) {
            warn!("launch refused: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers, MouseEvent};

    fn effect(config: &Config) -> NightCityEffect {
        NightCityEffect::new(80, 48, config)
    }

    fn seeded() -> Config {
        let mut config = Config::default();
        config.simulation.seed = Some(5);
        config
    }

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    #[test]
    fn space_launches_from_the_ground() {
        let mut fx = effect(&seeded());
        fx.handle_event(&key(' '));
        assert_eq!(fx.registry.len(), 1);
        let shell = fx.registry.active_particles().next().unwrap();
        assert_eq!(shell.position().y, GROUND_Y);
    }

    #[test]
    fn click_launches_under_the_cursor() {
        let mut fx = effect(&seeded());
        fx.handle_event(&Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 40,
            row: 10,
            modifiers: KeyModifiers::NONE,
        }));
        let shell = fx.registry.active_particles().next().unwrap();
        assert!((shell.position().x - fx.viewport.column_to_sim_x(40)).abs() < 1e-6);
    }

    #[test]
    fn launches_beyond_the_cap_are_dropped() {
        let mut config = seeded();
        config.simulation.max_fireworks = 3;
        let mut fx = effect(&config);
        for _ in 0..10 {
            fx.handle_event(&key(' '));
        }
        assert_eq!(fx.registry.len(), 3);
    }

    #[test]
    fn auto_launch_fires_on_a_timer() {
        let mut config = seeded();
        config.launch.auto = true;
        let mut fx = effect(&config);
        for _ in 0..60 * 3 {
            fx.update(1.0 / 60.0);
        }
        assert!(fx.registry.len() >= 2);

        fx.handle_event(&key('a'));
        assert!(!fx.auto_launch);
    }

    #[test]
    fn idle_without_input() {
        let mut fx = effect(&seeded());
        for _ in 0..120 {
            fx.update(1.0 / 60.0);
        }
        assert!(fx.registry.is_empty());
    }
}
