//! In-block permutation: rows and columns of each cell are shuffled, so the
//! cell keeps its multiset of pixels.

use image::RgbImage;
use rand::Rng;

use crate::utils::rng::permutation;

/// Applies a random row permutation, then a random column permutation.
pub fn shuffle_cell<R: Rng + ?Sized>(cell: &RgbImage, rng: &mut R) -> RgbImage {
    let (width, height) = cell.dimensions();
    let rows = permutation(height as usize, rng);
    let cols = permutation(width as usize, rng);
    RgbImage::from_fn(width, height, |x, y| {
        *cell.get_pixel(cols[x as usize] as u32, rows[y as usize] as u32)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::partition;
    use crate::strategies::Strategy;
    use crate::utils::rng::scramble_rng;
    use image::Rgb;

    fn sorted_pixels(img: &RgbImage) -> Vec<[u8; 3]> {
        let mut pixels: Vec<[u8; 3]> = img.pixels().map(|p| p.0).collect();
        pixels.sort_unstable();
        pixels
    }

    #[test]
    fn test_cell_multiset_is_preserved() {
        let image = RgbImage::from_fn(30, 21, |x, y| Rgb([x as u8, y as u8, (x * y) as u8]));
        let out = Strategy::WithinBlocks
            .apply(&image, 3, 3, &mut scramble_rng(Some(8)))
            .unwrap();

        let before = partition(&image, 3, 3).unwrap();
        let after = partition(&out, 3, 3).unwrap();
        for (a, b) in before.iter().zip(after.iter()) {
            assert_eq!(sorted_pixels(&a.buffer), sorted_pixels(&b.buffer));
        }
        assert_ne!(out, image);
    }

    #[test]
    fn test_rows_stay_intact_as_sets() {
        // Every pixel in a row shares the row's red value, so a row
        // permutation followed by a column permutation keeps rows uniform.
        let cell = RgbImage::from_fn(5, 6, |x, y| Rgb([y as u8, x as u8, 0]));
        let out = shuffle_cell(&cell, &mut scramble_rng(Some(4)));
        for y in 0..6 {
            let red = out.get_pixel(0, y)[0];
            assert!((0..5).all(|x| out.get_pixel(x, y)[0] == red));
        }
    }
}
