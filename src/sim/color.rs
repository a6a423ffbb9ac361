use std::fmt;

use fastrand::Rng;

use super::uniform;

/// Linear RGBA colour, channels nominally in `[0, 1]`.
///
/// Alpha is the fade-out channel. Nothing here clamps: the fade formulas keep
/// it in range for sane inputs and the rasteriser clamps on output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

/// Colour family of a single firework, fixed when the shell is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorTheme {
    Red,
    Blue,
    Purple,
    Gold,
    Green,
    Rainbow,
    Silver,
    Pink,
}

/// How fragment colours are sampled for a theme.
#[derive(Debug, Clone, Copy)]
enum FragmentRule {
    /// Independent uniform draws per RGB channel.
    Channels([(f32, f32); 3]),
    /// Random hue through the six-sector approximation in [`rainbow`].
    Hue,
    /// Shared grey level with a little jitter on blue.
    Silver,
}

#[derive(Debug, Clone, Copy)]
struct Palette {
    launch: Rgba,
    fragments: FragmentRule,
}

impl ColorTheme {
    pub const ALL: [ColorTheme; 8] = [
        ColorTheme::Red,
        ColorTheme::Blue,
        ColorTheme::Purple,
        ColorTheme::Gold,
        ColorTheme::Green,
        ColorTheme::Rainbow,
        ColorTheme::Silver,
        ColorTheme::Pink,
    ];

    /// Uniform pick over [`ColorTheme::ALL`].
    pub fn random(rng: &mut Rng) -> Self {
        Self::ALL[rng.usize(0..Self::ALL.len())]
    }

    const fn palette(self) -> Palette {
        use FragmentRule::*;
        match self {
            ColorTheme::Red => Palette {
                launch: Rgba::opaque(1.0, 0.3, 0.0),
                fragments: Channels([(0.8, 1.0), (0.0, 0.5), (0.0, 0.2)]),
            },
            ColorTheme::Blue => Palette {
                launch: Rgba::opaque(0.2, 0.4, 1.0),
                fragments: Channels([(0.0, 0.2), (0.3, 0.8), (0.8, 1.0)]),
            },
            ColorTheme::Purple => Palette {
                launch: Rgba::opaque(0.7, 0.2, 1.0),
                fragments: Channels([(0.5, 0.9), (0.0, 0.4), (0.8, 1.0)]),
            },
            ColorTheme::Gold => Palette {
                launch: Rgba::opaque(1.0, 0.8, 0.0),
                fragments: Channels([(0.8, 1.0), (0.7, 1.0), (0.0, 0.3)]),
            },
            ColorTheme::Green => Palette {
                launch: Rgba::opaque(0.1, 0.8, 0.2),
                fragments: Channels([(0.0, 0.3), (0.7, 1.0), (0.0, 0.5)]),
            },
            // White rocket, the colour only shows up in the burst.
            ColorTheme::Rainbow => Palette {
                launch: Rgba::opaque(1.0, 1.0, 1.0),
                fragments: Hue,
            },
            ColorTheme::Silver => Palette {
                launch: Rgba::opaque(0.8, 0.8, 1.0),
                fragments: Silver,
            },
            ColorTheme::Pink => Palette {
                launch: Rgba::opaque(1.0, 0.5, 0.8),
                fragments: Channels([(0.9, 1.0), (0.4, 0.8), (0.7, 1.0)]),
            },
        }
    }

    /// Fixed colour of the ascending launch particle.
    pub fn launch_color(self) -> Rgba {
        self.palette().launch
    }

    /// Draws one fragment colour. Called once per burst curve.
    pub fn fragment_color(self, rng: &mut Rng) -> Rgba {
        match self.palette().fragments {
            FragmentRule::Channels([r, g, b]) => Rgba::opaque(
                uniform(rng, r.0, r.1),
                uniform(rng, g.0, g.1),
                uniform(rng, b.0, b.1),
            ),
            FragmentRule::Hue => rainbow(rng.f32()),
            FragmentRule::Silver => {
                let v = uniform(rng, 0.7, 1.0);
                // Blue may land slightly above 1.0.
                Rgba::opaque(v, v, uniform(rng, v - 0.1, v + 0.1))
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorTheme::Red => "red",
            ColorTheme::Blue => "blue",
            ColorTheme::Purple => "purple",
            ColorTheme::Gold => "gold",
            ColorTheme::Green => "green",
            ColorTheme::Rainbow => "rainbow",
            ColorTheme::Silver => "silver",
            ColorTheme::Pink => "pink",
        }
    }
}

impl fmt::Display for ColorTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cheap hue wheel: six sectors, each a linear ramp on one channel with the
/// third channel pinned at 0.5. Not a colorimetric HSV conversion.
///
/// `hue` is expected in `[0, 1)`; `1.0` and above fall into the last sector.
pub fn rainbow(hue: f32) -> Rgba {
    const N: f32 = 0.5;

    let h = hue * 6.0;
    let sector = h as u32;
    let mut f = h - sector as f32;
    if sector % 2 == 0 {
        f = 1.0 - f;
    }

    match sector {
        0 => Rgba::opaque(1.0, f, N),
        1 => Rgba::opaque(f, 1.0, N),
        2 => Rgba::opaque(N, 1.0, f),
        3 => Rgba::opaque(N, f, 1.0),
        4 => Rgba::opaque(f, N, 1.0),
        _ => Rgba::opaque(1.0, N, f),
    }
}
