//! Local replace: each cell becomes a flat patch of one of its own pixels.

use image::RgbImage;
use rand::Rng;

/// Samples one pixel position of `cell` (row first, then column) and fills
/// the whole cell with it.
pub fn fill_cell<R: Rng + ?Sized>(cell: &RgbImage, rng: &mut R) -> RgbImage {
    let (width, height) = cell.dimensions();
    if width == 0 || height == 0 {
        return cell.clone();
    }
    let y = rng.random_range(0..height);
    let x = rng.random_range(0..width);
    let pixel = *cell.get_pixel(x, y);
    RgbImage::from_pixel(width, height, pixel)
}
