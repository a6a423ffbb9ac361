//! Fireworks over a night-time skyline, drawn in the terminal.
//!
//! [`sim`] holds the particle simulation; [`scene`] and [`render`] build and
//! rasterise the backdrop; [`effects`] ties them to terminal input.

pub mod config;
pub mod effects;
pub mod error;
pub mod render;
pub mod scene;
pub mod sim;

pub use config::Config;
pub use error::{Error, Result};
