//! Static film-grain texture.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{BackdropError, Result};

/// Mid-grey around which the grain varies.
pub const NOISE_MIDPOINT: f32 = 128.0;
/// Full width of the grain variation, in channel units.
pub const NOISE_SPREAD: f32 = 18.0;

/// One grey value per pixel, in `128 +/- 9`.
///
/// Generated once per surface size; every frame reuses it.
#[derive(Debug, Clone)]
pub struct NoiseTexture {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl NoiseTexture {
    pub fn generate(width: u32, height: u32) -> Result<Self> {
        Self::generate_with(width, height, &mut StdRng::from_entropy())
    }

    /// Reproducible texture for snapshots and tests.
    pub fn seeded(width: u32, height: u32, seed: u64) -> Result<Self> {
        Self::generate_with(width, height, &mut StdRng::seed_from_u64(seed))
    }

    pub fn generate_with<R: Rng + ?Sized>(width: u32, height: u32, rng: &mut R) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(BackdropError::InvalidSize { width, height });
        }

        let len = width as usize * height as usize;
        let values = (0..len)
            .map(|_| NOISE_MIDPOINT + (rng.gen::<f32>() - 0.5) * NOISE_SPREAD)
            .collect();

        Ok(Self {
            width,
            height,
            values,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_stay_near_midpoint() {
        let noise = NoiseTexture::seeded(64, 32, 7).unwrap();
        assert_eq!(noise.values().len(), 64 * 32);

        let half = NOISE_SPREAD / 2.0;
        assert!(noise
            .values()
            .iter()
            .all(|v| (NOISE_MIDPOINT - half..=NOISE_MIDPOINT + half).contains(v)));

        let mean = noise.values().iter().sum::<f32>() / noise.values().len() as f32;
        assert!((mean - NOISE_MIDPOINT).abs() < 1.0);
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = NoiseTexture::seeded(16, 16, 42).unwrap();
        let b = NoiseTexture::seeded(16, 16, 42).unwrap();
        let c = NoiseTexture::seeded(16, 16, 43).unwrap();
        assert_eq!(a.values(), b.values());
        assert_ne!(a.values(), c.values());
    }

    #[test]
    fn test_zero_size_is_rejected() {
        assert!(matches!(
            NoiseTexture::generate(0, 10),
            Err(BackdropError::InvalidSize { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_get_is_bounds_checked() {
        let noise = NoiseTexture::seeded(4, 3, 1).unwrap();
        assert!(noise.get(3, 2).is_some());
        assert!(noise.get(4, 0).is_none());
        assert!(noise.get(0, 3).is_none());
    }
}
