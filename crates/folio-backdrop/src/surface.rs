//! Opaque RGB pixel buffer with the compositing operations the scene needs.

use std::io::Write;

use crate::color::Rgba;
use crate::error::{BackdropError, Result};
use crate::noise::NoiseTexture;

/// Opaque surface; channels are stored as `f32` in `0..=255`.
#[derive(Debug, Clone)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 3]>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(BackdropError::InvalidSize { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels: vec![[0.0; 3]; width as usize * height as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Overwrite every pixel; alpha is ignored.
    pub fn fill(&mut self, color: Rgba) {
        let rgb = [color.r, color.g, color.b];
        self.pixels.iter_mut().for_each(|p| *p = rgb);
    }

    /// Source-over compositing of `color` onto pixel `index`.
    pub fn blend(&mut self, index: usize, color: Rgba) {
        if color.a <= 0.0 {
            return;
        }
        if let Some(p) = self.pixels.get_mut(index) {
            let a = color.a.min(1.0);
            let inv = 1.0 - a;
            p[0] = p[0] * inv + color.r * a;
            p[1] = p[1] * inv + color.g * a;
            p[2] = p[2] * inv + color.b * a;
        }
    }

    /// Paint every pixel with the colour `shade(x, y)` returns, source-over.
    ///
    /// Coordinates are pixel centres.
    pub fn paint_with<F>(&mut self, mut shade: F)
    where
        F: FnMut(f32, f32) -> Rgba,
    {
        let width = self.width as usize;
        for index in 0..self.pixels.len() {
            let x = (index % width) as f32 + 0.5;
            let y = (index / width) as f32 + 0.5;
            let color = shade(x, y);
            self.blend(index, color);
        }
    }

    /// Overlay-blend a grey texture at `alpha`. The texture must match the
    /// surface size.
    pub fn overlay(&mut self, noise: &NoiseTexture, alpha: f32) -> Result<()> {
        if noise.width() != self.width || noise.height() != self.height {
            return Err(BackdropError::InvalidSize {
                width: noise.width(),
                height: noise.height(),
            });
        }

        for (p, &grey) in self.pixels.iter_mut().zip(noise.values()) {
            let source = grey / 255.0;
            for channel in p.iter_mut() {
                let backdrop = *channel / 255.0;
                let blended = if backdrop <= 0.5 {
                    2.0 * backdrop * source
                } else {
                    1.0 - 2.0 * (1.0 - backdrop) * (1.0 - source)
                };
                *channel += (blended * 255.0 - *channel) * alpha;
            }
        }
        Ok(())
    }

    /// Quantised RGB bytes, row-major.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|p| p.map(|c| c.round().clamp(0.0, 255.0) as u8))
            .collect()
    }

    /// Encode as a binary PPM (P6).
    pub fn write_ppm<W: Write>(&self, mut out: W) -> Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        out.write_all(&self.to_rgb8())?;
        out.flush()?;
        Ok(())
    }
}
