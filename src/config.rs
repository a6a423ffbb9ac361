//! Runtime settings, read from an optional TOML file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub display: DisplayConfig,
    pub simulation: SimulationConfig,
    pub launch: LaunchConfig,
    pub city: CityConfig,
    pub sky: SkyConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    pub fps: u32,
    /// Simulation steps allowed per rendered frame before time is dropped.
    pub max_catch_up_steps: u32,
    /// `RRGGBB` colour for the bottom of the sky.
    pub bg_color: Option<String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            max_catch_up_steps: 3,
            bg_color: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub seed: Option<u64>,
    /// Launches beyond this many live fireworks are dropped. 0 disables the cap.
    pub max_fireworks: usize,
    pub clamp_alpha: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_fireworks: 24,
            clamp_alpha: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LaunchConfig {
    pub auto: bool,
    pub interval_min: f32,
    pub interval_max: f32,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            auto: false,
            interval_min: 0.4,
            interval_max: 1.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CityConfig {
    pub seed: u64,
    pub window_chance: f32,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            window_chance: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SkyConfig {
    pub stars: usize,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self { stars: 150 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub filter: String,
    /// Log destination. Without one, logs are discarded while the UI runs.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "warn".into(),
            file: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.display.fps == 0 {
            return Err(Error::InvalidConfig("display.fps must be positive".into()));
        }
        let LaunchConfig {
            interval_min,
            interval_max,
            ..
        } = self.launch;
        if !(interval_min > 0.0 && interval_min <= interval_max && interval_max.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "launch interval must satisfy 0 < min <= max, got {interval_min}..{interval_max}"
            )));
        }
        if !(0.0..=1.0).contains(&self.city.window_chance) {
            return Err(Error::InvalidConfig(format!(
                "city.window_chance must be within [0, 1], got {}",
                self.city.window_chance
            )));
        }
        if let Some(hex) = &self.display.bg_color {
            if parse_hex_color(hex).is_none() {
                return Err(Error::InvalidConfig(format!(
                    "display.bg_color must be RRGGBB, got {hex:?}"
                )));
            }
        }
        Ok(())
    }

    /// Fixed simulation step in seconds.
    pub fn step(&self) -> f32 {
        1.0 / self.display.fps as f32
    }

    /// Sky bottom colour as floats, if one is configured.
    pub fn sky_bottom(&self) -> Option<[f32; 3]> {
        let (r, g, b) = parse_hex_color(self.display.bg_color.as_deref()?)?;
        Some([r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0])
    }
}

pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
        assert!((config.step() - 1.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config: Config = toml::from_str(
            r#"
            [simulation]
            seed = 7
            clamp_alpha = true

            [launch]
            auto = true
            "#,
        )
        .unwrap();
        assert_eq!(config.simulation.seed, Some(7));
        assert!(config.simulation.clamp_alpha);
        assert_eq!(config.simulation.max_fireworks, 24);
        assert!(config.launch.auto);
        assert_eq!(config.launch.interval_max, 1.4);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Config>("[display]\nfsp = 30\n").is_err());
    }

    #[test]
    fn validation_catches_bad_values() {
        let mut config = Config::default();
        config.launch.interval_min = 2.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = Config::default();
        config.display.fps = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.display.bg_color = Some("12345".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("1a1b26"), Some((0x1a, 0x1b, 0x26)));
        assert_eq!(parse_hex_color("#ff0000"), Some((255, 0, 0)));
        assert_eq!(parse_hex_color("zz0000"), None);

        let mut config = Config::default();
        config.display.bg_color = Some("ff0000".into());
        assert_eq!(config.sky_bottom(), Some([1.0, 0.0, 0.0]));
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let dir = std::env::temp_dir().join(format!("nightfire-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        fs::write(&path, "[display\nfps = 60").unwrap();
        match Config::load(&path) {
            Err(Error::ConfigParse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected parse error, got {other:?}"),
        }
        fs::remove_dir_all(&dir).unwrap();
    }
}
