use std::io::Write;

use crate::scene::city::{WINDOW_HEIGHT, WINDOW_WIDTH};
use crate::scene::sky::{GLOW_ALPHA, MOON_COLOR, Rgb};
use crate::scene::{Building, Scene, Starfield};
use crate::sim::{Particle, Rgba, Shape};

use super::Viewport;

/// Canvas size of a particle per unit of simulation size.
const PARTICLE_SCALE: f32 = 35.0;
/// Canvas size of a trail dot per unit of sample size.
const TRAIL_SCALE: f32 = 20.0;
const GLOW_SCALE: f32 = 1.3;
const CURVE_END_BRIGHTEN: f32 = 1.3;

const BACK_BUILDING: Rgb = [0.0, 0.0, 0.0];
const MAIN_BUILDING: Rgb = [0.05, 0.05, 0.15];
const WINDOW_LIGHT: Rgb = [1.0, 1.0, 0.7];

/// Float RGB framebuffer over the terminal pixel grid.
///
/// The static backdrop is painted once per viewport; each frame starts from
/// a copy of it, adds the stars and then blends particles additively.
pub struct Frame {
    viewport: Viewport,
    backdrop: Vec<Rgb>,
    open_sky: Vec<bool>,
    pixels: Vec<Rgb>,
}

impl Frame {
    pub fn new(viewport: Viewport, scene: &Scene) -> Self {
        let len = viewport.width * viewport.height;
        let mut frame = Self {
            viewport,
            backdrop: vec![[0.0; 3]; len],
            open_sky: vec![true; len],
            pixels: vec![[0.0; 3]; len],
        };
        frame.paint_backdrop(scene);
        frame
    }

    fn paint_backdrop(&mut self, scene: &Scene) {
        let Viewport { width, height } = self.viewport;
        for py in 0..height {
            for px in 0..width {
                let (x, y) = self.viewport.pixel_to_canvas(px, py);
                let idx = py * width + px;

                let mut color = scene.sky.color_at(y);
                for _ in 0..scene.moon.glow_layers(x, y) {
                    color = mix(color, MOON_COLOR, GLOW_ALPHA);
                }
                if scene.moon.covers(x, y) {
                    color = scene.moon.surface_color(x, y);
                    self.open_sky[idx] = false;
                }
                if covered(&scene.city.back, x, y) {
                    color = BACK_BUILDING;
                    self.open_sky[idx] = false;
                }
                if covered(&scene.city.main, x, y) {
                    color = MAIN_BUILDING;
                    self.open_sky[idx] = false;
                }
                self.backdrop[idx] = color;
            }
        }

        // Windows are smaller than a terminal pixel at most sizes, so they
        // are blended by how much of each pixel they cover.
        let (sx, sy) = self.viewport.scale();
        for building in &scene.city.main {
            for &(wx, wy) in &building.windows {
                let (x0, y1) = self.viewport.canvas_to_pixel(wx, wy);
                let (x1, y0) = (x0 + WINDOW_WIDTH * sx, y1 - WINDOW_HEIGHT * sy);
                self.cover_rect(x0, y0, x1, y1, WINDOW_LIGHT);
            }
        }
    }

    fn cover_rect(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgb) {
        let Viewport { width, height } = self.viewport;
        let (cx0, cx1) = (x0.floor().max(0.0) as usize, (x1.ceil() as usize).min(width));
        let (cy0, cy1) = (y0.floor().max(0.0) as usize, (y1.ceil() as usize).min(height));
        for py in cy0..cy1 {
            for px in cx0..cx1 {
                let ox = (x1.min(px as f32 + 1.0) - x0.max(px as f32)).max(0.0);
                let oy = (y1.min(py as f32 + 1.0) - y0.max(py as f32)).max(0.0);
                let idx = py * width + px;
                self.backdrop[idx] = mix(self.backdrop[idx], color, (ox * oy).min(1.0));
            }
        }
    }

    /// Resets to the backdrop and lays the stars over any open sky.
    pub fn begin(&mut self, stars: &Starfield) {
        self.pixels.copy_from_slice(&self.backdrop);
        for (star, brightness) in stars.twinkling() {
            let (px, py) = self.viewport.canvas_to_pixel(star.x, star.y);
            if let Some(idx) = self.index(px, py) {
                if self.open_sky[idx] {
                    self.pixels[idx] = mix(self.pixels[idx], [1.0; 3], brightness);
                }
            }
        }
    }

    /// Trail, glow and body of one particle, blended additively.
    pub fn draw_particle(&mut self, particle: &Particle) {
        let trail = particle.trail();
        for (a, b) in trail.iter().zip(trail.iter().skip(1)) {
            let from = self.viewport.sim_to_pixel(a.position);
            let to = self.viewport.sim_to_pixel(b.position);
            self.line(from, to, b.color);
        }
        for sample in trail.iter() {
            let center = self.viewport.sim_to_pixel(sample.position);
            self.stamp(center, sample.size * TRAIL_SCALE, Shape::Circle, 0.0, sample.color);
        }

        let center = self.viewport.sim_to_pixel(particle.position());
        let size = particle.size() * PARTICLE_SCALE;
        let mut color = particle.color();
        if particle.is_curve_end() {
            color.r = (color.r * CURVE_END_BRIGHTEN).min(1.0);
            color.g = (color.g * CURVE_END_BRIGHTEN).min(1.0);
            color.b = (color.b * CURVE_END_BRIGHTEN).min(1.0);
        }

        if particle.is_curve_end() || particle.size() > 0.3 {
            let glow = color.with_alpha(color.a * 0.3);
            self.stamp(center, size * GLOW_SCALE, particle.shape(), particle.rotation(), glow);
        }
        self.stamp(center, size, particle.shape(), particle.rotation(), color);
    }

    /// Fills a disc or rotated square of canvas diameter `size`. Anything
    /// smaller than a pixel still lights the pixel it sits in.
    fn stamp(&mut self, center: (f32, f32), size: f32, shape: Shape, rotation: f32, color: Rgba) {
        if !(center.0.is_finite() && center.1.is_finite() && size.is_finite()) {
            return;
        }
        let (sx, sy) = self.viewport.scale();
        let half = size / 2.0;
        let (rx, ry) = (half * sx, half * sy);

        if rx < 0.5 && ry < 0.5 {
            self.add(center.0, center.1, color);
            return;
        }

        let (sin, cos) = (-rotation.to_radians()).sin_cos();
        let reach = if shape == Shape::Square { std::f32::consts::SQRT_2 } else { 1.0 };
        // Only pixels on the grid matter.
        let (w, h) = (self.viewport.width as f32, self.viewport.height as f32);
        let x0 = (center.0 - rx * reach).floor().max(0.0);
        let x1 = (center.0 + rx * reach).ceil().min(w);
        let y0 = (center.1 - ry * reach).floor().max(0.0);
        let y1 = (center.1 + ry * reach).ceil().min(h);

        let mut y = y0;
        while y <= y1 {
            let mut x = x0;
            while x <= x1 {
                // Back to canvas units relative to the centre; canvas y is up.
                let dx = (x + 0.5 - center.0) / sx;
                let dy = -(y + 0.5 - center.1) / sy;
                let inside = match shape {
                    Shape::Circle => dx * dx + dy * dy <= half * half,
                    Shape::Square => {
                        let (u, v) = (dx * cos - dy * sin, dx * sin + dy * cos);
                        u.abs() <= half && v.abs() <= half
                    }
                };
                if inside {
                    self.add(x + 0.5, y + 0.5, color);
                }
                x += 1.0;
            }
            y += 1.0;
        }
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgba) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0);
        if !steps.is_finite() {
            return;
        }
        for i in 1..=steps as usize {
            let t = i as f32 / steps;
            self.add(from.0 + dx * t, from.1 + dy * t, color);
        }
    }

    fn add(&mut self, px: f32, py: f32, color: Rgba) {
        let Some(idx) = self.index(px, py) else {
            return;
        };
        let a = color.a.clamp(0.0, 1.0);
        let pixel = &mut self.pixels[idx];
        pixel[0] += color.r * a;
        pixel[1] += color.g * a;
        pixel[2] += color.b * a;
    }

    fn index(&self, px: f32, py: f32) -> Option<usize> {
        if !(px >= 0.0 && py >= 0.0) {
            return None;
        }
        let (x, y) = (px as usize, py as usize);
        (x < self.viewport.width && y < self.viewport.height).then(|| y * self.viewport.width + x)
    }

    #[cfg(test)]
    fn pixel(&self, x: usize, y: usize) -> Rgb {
        self.pixels[y * self.viewport.width + x]
    }

    /// Writes the frame as `▄` cells: background is the upper pixel,
    /// foreground the lower one.
    pub fn encode(&self, out: &mut Vec<u8>) -> std::io::Result<()> {
        let Viewport { width, height } = self.viewport;
        out.extend_from_slice(b"\x1b[H");

        let mut prev_top: Option<(u8, u8, u8)> = None;
        let mut prev_bot: Option<(u8, u8, u8)> = None;

        for y in (0..height).step_by(2) {
            for x in 0..width {
                let top = to_rgb8(self.pixels[y * width + x]);
                let bot = if y + 1 < height {
                    to_rgb8(self.pixels[(y + 1) * width + x])
                } else {
                    top
                };

                if prev_top != Some(top) {
                    write!(out, "\x1b[48;2;{};{};{}m", top.0, top.1, top.2)?;
                    prev_top = Some(top);
                }
                if prev_bot != Some(bot) {
                    write!(out, "\x1b[38;2;{};{};{}m", bot.0, bot.1, bot.2)?;
                    prev_bot = Some(bot);
                }
                out.extend_from_slice("▄".as_bytes());
            }
            out.extend_from_slice(b"\x1b[0m");
            prev_top = None;
            prev_bot = None;
            if y + 2 < height {
                out.extend_from_slice(b"\r\n");
            }
        }
        Ok(())
    }
}

fn covered(layer: &[Building], x: f32, y: f32) -> bool {
    layer
        .iter()
        .any(|building| building.roof_at(x).is_some_and(|top| y <= top))
}

fn mix(under: Rgb, over: Rgb, alpha: f32) -> Rgb {
    [
        under[0] * (1.0 - alpha) + over[0] * alpha,
        under[1] * (1.0 - alpha) + over[1] * alpha,
        under[2] * (1.0 - alpha) + over[2] * alpha,
    ]
}

fn to_rgb8(c: Rgb) -> (u8, u8, u8) {
    let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    (q(c[0]), q(c[1]), q(c[2]))
}
