//! Noise-and-blur degradation: every cycle adds zero-mean Gaussian noise
//! with a standard deviation of 255 to each sample, then smooths the whole
//! buffer with a Gaussian kernel. Values stay unclamped between cycles.

use image::{Rgb, RgbImage};
use ndarray::Array2;
use rand::Rng;
use rand_distr::StandardNormal;
use tracing::debug;

use crate::config::NoiseBlurOptions;
use crate::error::Result;
use crate::strategies::gradient::correlate;

/// Noise amplitude, one full 8-bit range per standard deviation.
const NOISE_SCALE: f64 = 255.0;

/// Normalised 1D Gaussian weights of odd length `size`.
///
/// A non-positive `sigma` is derived from the size as
/// `0.3 * ((size - 1) / 2 - 1) + 0.8`.
pub fn gaussian_weights(size: u32, sigma: f64) -> Vec<f64> {
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8
    };
    let centre = (size as f64 - 1.0) / 2.0;
    let raw: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - centre;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

fn gaussian_kernel(size: u32, sigma: f64) -> Array2<f64> {
    let weights = gaussian_weights(size, sigma);
    let n = size as usize;
    Array2::from_shape_fn((n, n), |(y, x)| weights[y] * weights[x])
}

pub fn scramble<R: Rng + ?Sized>(
    image: &RgbImage,
    options: &NoiseBlurOptions,
    rng: &mut R,
) -> Result<RgbImage> {
    options.validate()?;
    let (width, height) = image.dimensions();
    debug!(width, height, cycles = options.cycles, kernel = options.kernel, sigma = options.sigma, "noise blur");
    if width == 0 || height == 0 {
        return Ok(image.clone());
    }

    let (w, h) = (width as usize, height as usize);
    let mut channels: Vec<Array2<f64>> = (0..3)
        .map(|c| {
            Array2::from_shape_fn((h, w), |(y, x)| image.get_pixel(x as u32, y as u32)[c] as f64)
        })
        .collect();
    let kernel = gaussian_kernel(options.kernel, options.sigma);

    for _ in 0..options.cycles {
        // Noise is drawn pixel by pixel, channels innermost.
        for y in 0..h {
            for x in 0..w {
                for channel in channels.iter_mut() {
                    let z: f64 = rng.sample(StandardNormal);
                    channel[[y, x]] += z * NOISE_SCALE;
                }
            }
        }
        channels = channels.iter().map(|channel| correlate(channel, &kernel)).collect();
    }

    Ok(RgbImage::from_fn(width, height, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let sample = |c: usize| channels[c][[y, x]].round().clamp(0.0, 255.0) as u8;
        Rgb([sample(0), sample(1), sample(2)])
    }))
}
