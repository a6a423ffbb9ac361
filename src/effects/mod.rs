use crossterm::event::Event;
use std::io::{BufWriter, Stdout};

use crate::config::Config;

pub mod night_city;

pub use night_city::NightCityEffect;

pub trait Effect {
    fn new(width: usize, height: usize, config: &Config) -> Self
    where
        Self: Sized;
    fn update(&mut self, dt: f32);
    fn render(&mut self, stdout: &mut BufWriter<Stdout>) -> std::io::Result<()>;
    fn handle_event(&mut self, _event: &Event) {}
}
