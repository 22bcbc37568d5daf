//! Per-cell rotation by a random angle in `[-45°, 45°]`.

use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use rand::Rng;

/// Largest rotation, in degrees, in either direction.
pub const MAX_ANGLE_DEGREES: f32 = 45.0;

/// Rotates `cell` counter-clockwise by `degrees` about its centre with
/// bilinear interpolation. The cell keeps its size: corners rotated out are
/// cropped and uncovered areas are filled with black.
pub fn rotate_by(cell: &RgbImage, degrees: f32) -> RgbImage {
    // imageproc rotates clockwise for positive angles.
    rotate_about_center(
        cell,
        -degrees.to_radians(),
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
    )
}

pub fn rotate_cell<R: Rng + ?Sized>(cell: &RgbImage, rng: &mut R) -> RgbImage {
    let degrees = rng.random_range(-MAX_ANGLE_DEGREES..=MAX_ANGLE_DEGREES);
    rotate_by(cell, degrees)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::rng::scramble_rng;

    #[test]
    fn test_rotation_keeps_size_and_fills_corners() {
        let cell = RgbImage::from_pixel(20, 20, Rgb([200, 200, 200]));
        let out = rotate_by(&cell, 45.0);
        assert_eq!(out.dimensions(), (20, 20));
        assert_eq!(*out.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert!(out.get_pixel(10, 10).0.iter().all(|&v| v >= 199));
    }

    #[test]
    fn test_random_rotation_preserves_shape() {
        let cell = RgbImage::from_pixel(13, 8, Rgb([1, 2, 3]));
        let mut rng = scramble_rng(Some(21));
        for _ in 0..10 {
            assert_eq!(rotate_cell(&cell, &mut rng).dimensions(), (13, 8));
        }
    }
}
