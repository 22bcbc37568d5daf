//! Horizontal strip shuffle: the image is cut into full-width strips which
//! are stacked back together in random order.

use image::RgbImage;
use rand::Rng;

use crate::error::{Result, ScrambleError};
use crate::partition::{CellRect, crop, paste};
use crate::utils::rng::permutation;

/// Strip heights for `height` rows in `splits` strips. The first
/// `height % splits` strips carry one extra row; with more strips than rows
/// the trailing strips are empty.
pub fn strip_heights(height: u32, splits: u32) -> Vec<u32> {
    let base = height / splits;
    let extra = height % splits;
    (0..splits).map(|i| base + u32::from(i < extra)).collect()
}

pub fn scramble<R: Rng + ?Sized>(image: &RgbImage, splits: u32, rng: &mut R) -> Result<RgbImage> {
    let (width, height) = image.dimensions();
    if splits == 0 {
        return Err(ScrambleError::InvalidParameter(format!(
            "cannot cut {} rows into 0 strips",
            height
        )));
    }

    let mut strips = Vec::with_capacity(splits as usize);
    let mut y = 0;
    for (i, strip_height) in strip_heights(height, splits).into_iter().enumerate() {
        let rect = CellRect {
            row: i as u32,
            col: 0,
            x: 0,
            y,
            width,
            height: strip_height,
        };
        strips.push(crop(image, &rect));
        y += strip_height;
    }

    let order = permutation(strips.len(), rng);
    let mut out = RgbImage::new(width, height);
    let mut y = 0;
    for (i, &source) in order.iter().enumerate() {
        let strip = &strips[source];
        let rect = CellRect {
            row: i as u32,
            col: 0,
            x: 0,
            y,
            width,
            height: strip.height(),
        };
        paste(&mut out, strip, &rect);
        y += strip.height();
    }
    Ok(out)
}
