use fastrand::Rng;

use super::CANVAS_WIDTH;

pub const WINDOW_WIDTH: f32 = 6.0;
pub const WINDOW_HEIGHT: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoofShape {
    Flat,
    Step,
    Tower,
    Eiffel,
    Chimney,
}

impl RoofShape {
    const ALL: [RoofShape; 5] = [
        RoofShape::Flat,
        RoofShape::Step,
        RoofShape::Tower,
        RoofShape::Eiffel,
        RoofShape::Chimney,
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub x: f32,
    pub width: f32,
    pub height: f32,
    pub shape: RoofShape,
    pub has_windows: bool,
    /// Bottom-left corners of lit windows.
    pub windows: Vec<(f32, f32)>,
}

impl Building {
    fn new(x: f32, width: f32, height: f32, shape: RoofShape, window_chance: Option<f32>) -> Self {
        let mut building = Self {
            x,
            width,
            height,
            shape,
            has_windows: window_chance.is_some(),
            windows: Vec::new(),
        };
        if let Some(chance) = window_chance {
            building.light_windows(chance);
        }
        building
    }

    /// Windows come from a generator seeded by the building's own geometry,
    /// so the same building always gets the same lights.
    fn light_windows(&mut self, chance: f32) {
        let seed = (self.x as u64).wrapping_mul(73_856_093)
            ^ (self.width as u64).wrapping_mul(19_349_663)
            ^ (self.height as u64).wrapping_mul(83_492_791);
        let mut rng = Rng::with_seed(seed % 10_000);

        let cols = (self.width / 15.0) as u32;
        let rows = (self.height / 15.0) as u32;
        for i in 0..cols {
            for j in 0..rows {
                if rng.f32() >= chance {
                    continue;
                }
                let wx = self.x + 5.0 + i as f32 * 12.0;
                let wy = 5.0 + j as f32 * 15.0;
                if wy + WINDOW_HEIGHT < self.height {
                    self.windows.push((wx, wy));
                }
            }
        }
    }

    /// Top of the silhouette at canvas column `x`, or `None` outside the
    /// building's footprint.
    pub fn roof_at(&self, x: f32) -> Option<f32> {
        let (left, w, h) = (self.x, self.width, self.height);
        if x < left || x > left + w {
            return None;
        }
        let centre = left + w / 2.0;

        let top = match self.shape {
            RoofShape::Flat => h,
            RoofShape::Step => {
                if x >= left + w * 0.3 && x <= left + w * 0.7 {
                    h
                } else {
                    h - 20.0
                }
            }
            RoofShape::Tower => {
                if (x - centre).abs() <= w * 0.15 {
                    h
                } else {
                    h - 30.0
                }
            }
            RoofShape::Eiffel => {
                let d = (x - centre).abs();
                if d <= 5.0 {
                    h + 20.0 - 60.0 * d / 5.0
                } else {
                    h - 40.0
                }
            }
            RoofShape::Chimney => {
                if (x - centre).abs() <= w * 0.1 {
                    h + 25.0
                } else {
                    h
                }
            }
        };
        Some(top)
    }
}

#[derive(Debug, Clone, Copy)]
struct LayerParams {
    min_height: u32,
    max_height: u32,
    density: f32,
    windows: bool,
    y_offset: f32,
}

/// Tall unlit silhouettes behind the main row.
const BACK_LAYER: LayerParams = LayerParams {
    min_height: 250,
    max_height: 350,
    density: 0.8,
    windows: false,
    y_offset: 30.0,
};

const MAIN_LAYER: LayerParams = LayerParams {
    min_height: 200,
    max_height: 280,
    density: 1.0,
    windows: true,
    y_offset: 0.0,
};

/// Two rows of buildings spanning the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    pub back: Vec<Building>,
    pub main: Vec<Building>,
}

impl City {
    pub fn generate(seed: u64, window_chance: f32) -> Self {
        Self {
            back: generate_layer(BACK_LAYER, seed, window_chance),
            main: generate_layer(MAIN_LAYER, seed, window_chance),
        }
    }

    pub fn buildings(&self) -> impl Iterator<Item = &Building> + '_ {
        self.back.iter().chain(self.main.iter())
    }
}

fn generate_layer(params: LayerParams, seed: u64, window_chance: f32) -> Vec<Building> {
    let layer_seed = seed.wrapping_add(u64::from(params.min_height + params.max_height));
    let mut rng = Rng::with_seed(layer_seed);
    let chance = params.windows.then_some(window_chance);

    let mut layer = Vec::new();
    let mut x = 0u32;
    while (x as f32) < CANVAS_WIDTH {
        let w = rng.u32(50..=90);
        let h = rng.u32(params.min_height..=params.max_height);
        let shape = RoofShape::ALL[rng.usize(0..RoofShape::ALL.len())];
        layer.push(Building::new(
            x as f32,
            w as f32,
            h as f32 + params.y_offset,
            shape,
            chance,
        ));
        x += (w as f32 * params.density) as u32 + rng.u32(3..=12);
    }
    layer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn building(shape: RoofShape) -> Building {
        Building::new(100.0, 60.0, 200.0, shape, None)
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        assert_eq!(City::generate(42, 0.5), City::generate(42, 0.5));
        assert_ne!(City::generate(42, 0.5), City::generate(43, 0.5));
    }

    #[test]
    fn layers_span_the_canvas() {
        let city = City::generate(42, 0.5);
        for layer in [&city.back, &city.main] {
            let first = &layer[0];
            let last = layer.last().unwrap();
            assert_eq!(first.x, 0.0);
            assert!(last.x < CANVAS_WIDTH);
            assert!(last.x + last.width + 12.0 >= CANVAS_WIDTH);
            assert!(layer.windows(2).all(|pair| pair[1].x > pair[0].x));
        }
    }

    #[test]
    fn only_the_main_layer_has_windows() {
        let city = City::generate(7, 0.5);
        assert!(city.back.iter().all(|b| !b.has_windows && b.windows.is_empty()));
        assert!(city.back.iter().all(|b| b.height >= 280.0 && b.height <= 380.0));
        assert!(city.main.iter().all(|b| b.has_windows));
        assert!(city.main.iter().any(|b| !b.windows.is_empty()));
        for b in &city.main {
            for &(wx, wy) in &b.windows {
                assert!(wx >= b.x + 5.0);
                assert!(wy + WINDOW_HEIGHT < b.height);
            }
        }
    }

    #[test]
    fn window_chance_extremes() {
        let dark = City::generate(1, 0.0);
        assert!(dark.main.iter().all(|b| b.windows.is_empty()));
        let lit = City::generate(1, 1.0);
        let b = &lit.main[0];
        let rows = (b.height / 15.0) as usize;
        let fitting = (0..rows)
            .filter(|j| 5.0 + *j as f32 * 15.0 + WINDOW_HEIGHT < b.height)
            .count();
        assert_eq!(b.windows.len(), (b.width / 15.0) as usize * fitting);
    }

    #[test]
    fn roof_profiles() {
        assert_eq!(building(RoofShape::Flat).roof_at(99.0), None);
        assert_eq!(building(RoofShape::Flat).roof_at(161.0), None);
        assert_eq!(building(RoofShape::Flat).roof_at(110.0), Some(200.0));

        let step = building(RoofShape::Step);
        assert_eq!(step.roof_at(105.0), Some(180.0));
        assert_eq!(step.roof_at(130.0), Some(200.0));

        let tower = building(RoofShape::Tower);
        assert_eq!(tower.roof_at(105.0), Some(170.0));
        assert_eq!(tower.roof_at(130.0), Some(200.0));

        let eiffel = building(RoofShape::Eiffel);
        assert_eq!(eiffel.roof_at(130.0), Some(220.0));
        assert_eq!(eiffel.roof_at(135.0), Some(160.0));
        assert_eq!(eiffel.roof_at(150.0), Some(160.0));

        let chimney = building(RoofShape::Chimney);
        assert_eq!(chimney.roof_at(130.0), Some(225.0));
        assert_eq!(chimney.roof_at(110.0), Some(200.0));
    }
}
