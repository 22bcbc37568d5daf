//! Classic block shuffle: cells trade places according to a uniform random
//! permutation.

use image::{Rgb, RgbImage};
use rand::Rng;

use crate::error::{Result, ScrambleError};
use crate::partition::{Cell, CellRect, Grid, partition_grid, reassemble};
use crate::utils::rng::permutation;

pub fn scramble<R: Rng + ?Sized>(image: &RgbImage, grid: &Grid, rng: &mut R) -> Result<RgbImage> {
    let perm = permutation(grid.len(), rng);
    with_permutation(image, grid, &perm)
}

/// Output cell `i` (row-major) receives the content of input cell `perm[i]`.
///
/// A cell landing on a position one pixel larger or smaller is cropped or
/// edge-extended to fit.
pub fn with_permutation(image: &RgbImage, grid: &Grid, perm: &[usize]) -> Result<RgbImage> {
    let mut seen = vec![false; grid.len()];
    if perm.len() != grid.len()
        || !perm
            .iter()
            .all(|&i| i < seen.len() && !std::mem::replace(&mut seen[i], true))
    {
        return Err(ScrambleError::InvalidParameter(format!(
            "not a permutation of {} cells: {:?}",
            grid.len(),
            perm
        )));
    }

    let cells = partition_grid(image, grid);
    let rects: Vec<CellRect> = grid.cells().collect();
    let placed: Vec<Cell<Rgb<u8>>> = rects
        .iter()
        .zip(perm)
        .map(|(rect, &source)| Cell {
            row: rect.row,
            col: rect.col,
            buffer: cells[source].fitted(rect.width, rect.height),
        })
        .collect();

    reassemble(&placed, grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::rng::scramble_rng;

    fn quadrant_image() -> RgbImage {
        // 100x100 with a distinct flat colour per 50x50 quadrant.
        RgbImage::from_fn(100, 100, |x, y| match (x < 50, y < 50) {
            (true, true) => Rgb([10, 0, 0]),
            (false, true) => Rgb([0, 20, 0]),
            (true, false) => Rgb([0, 0, 30]),
            (false, false) => Rgb([40, 40, 40]),
        })
    }

    #[test]
    fn test_reference_permutation() {
        let image = quadrant_image();
        let grid = Grid::new(100, 100, 2, 2).unwrap();
        let out = with_permutation(&image, &grid, &[2, 0, 3, 1]).unwrap();

        assert_eq!(*out.get_pixel(0, 0), Rgb([0, 0, 30]));
        assert_eq!(*out.get_pixel(99, 0), Rgb([10, 0, 0]));
        assert_eq!(*out.get_pixel(0, 99), Rgb([40, 40, 40]));
        assert_eq!(*out.get_pixel(99, 99), Rgb([0, 20, 0]));

        let expected = RgbImage::from_fn(100, 100, |x, y| match (x < 50, y < 50) {
            (true, true) => Rgb([0, 0, 30]),
            (false, true) => Rgb([10, 0, 0]),
            (true, false) => Rgb([40, 40, 40]),
            (false, false) => Rgb([0, 20, 0]),
        });
        assert_eq!(out, expected);
    }

    #[test]
    fn test_identity_permutation() {
        let image = quadrant_image();
        let grid = Grid::new(100, 100, 2, 2).unwrap();
        assert_eq!(with_permutation(&image, &grid, &[0, 1, 2, 3]).unwrap(), image);
    }

    #[test]
    fn test_rejects_non_permutations() {
        let image = quadrant_image();
        let grid = Grid::new(100, 100, 2, 2).unwrap();
        assert!(with_permutation(&image, &grid, &[0, 0, 1, 2]).is_err());
        assert!(with_permutation(&image, &grid, &[0, 1, 2]).is_err());
        assert!(with_permutation(&image, &grid, &[0, 1, 2, 4]).is_err());
    }

    #[test]
    fn test_seeded_scramble_matches_drawn_permutation() {
        let image = quadrant_image();
        let grid = Grid::new(100, 100, 2, 2).unwrap();
        let perm = permutation(4, &mut scramble_rng(Some(2024)));
        let expected = with_permutation(&image, &grid, &perm).unwrap();
        let out = scramble(&image, &grid, &mut scramble_rng(Some(2024))).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_pixel_sum_is_invariant() {
        let image = RgbImage::from_fn(60, 40, |x, y| Rgb([(x * 3) as u8, (y * 5) as u8, (x ^ y) as u8]));
        let grid = Grid::new(60, 40, 6, 4).unwrap();
        let out = scramble(&image, &grid, &mut scramble_rng(Some(5))).unwrap();
        let sum = |img: &RgbImage| img.as_raw().iter().map(|&v| v as u64).sum::<u64>();
        assert_eq!(sum(&out), sum(&image));
    }
}
