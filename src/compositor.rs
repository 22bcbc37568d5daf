//! Merges a scrambled buffer back into the original frame through a mask.

use image::{Rgb, RgbImage};
use ndarray::Array2;
use tracing::debug;

use crate::config::ScrambleConfig;
use crate::error::{Result, ScrambleError};
use crate::mask::Mask;

/// Fill level of the suppressed background.
pub const NEUTRAL_GRAY: u8 = 128;

const SOR_OMEGA: f64 = 1.8;
const MAX_SWEEPS: usize = 5000;
const TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeOptions {
    /// Keep the original background; otherwise fill it with [`NEUTRAL_GRAY`].
    pub background: bool,
    /// Gradient-domain blend of the face into the original.
    pub seamless: bool,
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self {
            background: true,
            seamless: false,
        }
    }
}

impl From<&ScrambleConfig> for CompositeOptions {
    fn from(config: &ScrambleConfig) -> Self {
        Self {
            background: config.background,
            seamless: config.seamless,
        }
    }
}

/// Combines `original` and `transformed` under `mask`.
///
/// Without blending, masked pixels come from `transformed` and the rest from
/// `original` (or flat gray when the background is dropped). With `seamless`
/// the masked region of `transformed` is Poisson-cloned into `original` with
/// its bounding box centred on `center`.
pub fn composite(
    original: &RgbImage,
    transformed: &RgbImage,
    mask: &Mask,
    center: (i32, i32),
    options: CompositeOptions,
) -> Result<RgbImage> {
    if original.dimensions() != transformed.dimensions() || original.dimensions() != mask.dimensions() {
        return Err(ScrambleError::InvalidParameter(format!(
            "buffers disagree on size: original {:?}, transformed {:?}, mask {:?}",
            original.dimensions(),
            transformed.dimensions(),
            mask.dimensions()
        )));
    }
    if options.seamless && !options.background {
        return Err(ScrambleError::Configuration(
            "seamless blending requires the background to be kept".into(),
        ));
    }

    if options.seamless {
        return Ok(seamless_clone(transformed, original, mask, center));
    }

    let fill = Rgb([NEUTRAL_GRAY; 3]);
    let (width, height) = original.dimensions();
    Ok(RgbImage::from_fn(width, height, |x, y| {
        if mask.contains(x, y) {
            *transformed.get_pixel(x, y)
        } else if options.background {
            *original.get_pixel(x, y)
        } else {
            fill
        }
    }))
}

/// Poisson `NORMAL_CLONE` of the masked part of `src` into `dst`.
///
/// The unknowns are the destination pixels covered by the translated mask.
/// Their discrete Laplacian is matched to the one of `src`, and pixels just
/// outside the region are held at their `dst` values. Solved per channel
/// with successive over-relaxation.
pub fn seamless_clone(src: &RgbImage, dst: &RgbImage, mask: &Mask, center: (i32, i32)) -> RgbImage {
    let mut out = dst.clone();
    let Some((x0, y0, x1, y1)) = mask.bounding_box() else {
        return out;
    };
    let (width, height) = dst.dimensions();
    let (w, h) = (width as i64, height as i64);

    // Translation taking the mask's bounding box centre to `center`.
    let dx = center.0 as i64 - (x0 as i64 + (x1 - x0 + 1) as i64 / 2);
    let dy = center.1 as i64 - (y0 as i64 + (y1 - y0 + 1) as i64 / 2);
    debug!(dx, dy, area = mask.area(), "seamless clone");

    // Unknown index per destination pixel; usize::MAX marks a fixed pixel.
    let mut index = Array2::from_elem((height as usize, width as usize), usize::MAX);
    let mut unknowns: Vec<(usize, usize)> = Vec::new();
    for y in y0..=y1 {
        for x in x0..=x1 {
            if !mask.contains(x, y) {
                continue;
            }
            let (tx, ty) = (x as i64 + dx, y as i64 + dy);
            // Border pixels have no full neighbourhood and stay fixed.
            if tx <= 0 || ty <= 0 || tx >= w - 1 || ty >= h - 1 {
                continue;
            }
            index[[ty as usize, tx as usize]] = unknowns.len();
            unknowns.push((tx as usize, ty as usize));
        }
    }
    if unknowns.is_empty() {
        return out;
    }

    let src_at = |x: i64, y: i64, c: usize| -> f64 {
        let sx = (x - dx).clamp(0, w - 1) as u32;
        let sy = (y - dy).clamp(0, h - 1) as u32;
        src.get_pixel(sx, sy)[c] as f64
    };

    const NEIGHBOURS: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

    for c in 0..3 {
        // Constant part of each equation: guidance plus fixed neighbours.
        let rhs: Vec<f64> = unknowns
            .iter()
            .map(|&(x, y)| {
                let (xi, yi) = (x as i64, y as i64);
                let g = src_at(xi, yi, c);
                NEIGHBOURS
                    .iter()
                    .map(|&(ox, oy)| {
                        let (nx, ny) = (xi + ox, yi + oy);
                        let guidance = g - src_at(nx, ny, c);
                        if index[[ny as usize, nx as usize]] == usize::MAX {
                            guidance + dst.get_pixel(nx as u32, ny as u32)[c] as f64
                        } else {
                            guidance
                        }
                    })
                    .sum()
            })
            .collect();

        let mut f: Vec<f64> = unknowns
            .iter()
            .map(|&(x, y)| src_at(x as i64, y as i64, c))
            .collect();

        for _ in 0..MAX_SWEEPS {
            let mut max_delta: f64 = 0.0;
            for (i, &(x, y)) in unknowns.iter().enumerate() {
                let mut sum = rhs[i];
                for &(ox, oy) in &NEIGHBOURS {
                    let j = index[[(y as i64 + oy) as usize, (x as i64 + ox) as usize]];
                    if j != usize::MAX {
                        sum += f[j];
                    }
                }
                let next = f[i] + SOR_OMEGA * (sum / 4.0 - f[i]);
                max_delta = max_delta.max((next - f[i]).abs());
                f[i] = next;
            }
            if max_delta < TOLERANCE {
                break;
            }
        }

        for (&(x, y), &v) in unknowns.iter().zip(f.iter()) {
            out.get_pixel_mut(x as u32, y as u32)[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }

    out
}
