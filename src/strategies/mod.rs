//! Block-level scramble strategies.
//!
//! Every strategy maps an RGB buffer to a buffer of identical shape, drawing
//! all randomness from the generator it is handed.

pub mod classic;
pub mod colormap;
pub mod gradient;
pub mod noise_blur;
pub mod pixel;
pub mod rotate;
pub mod stack;
pub mod within_blocks;

use image::RgbImage;
use rand::Rng;
use tracing::debug;

use crate::config::ScrambleKind;
use crate::error::{Result, ScrambleError};
use crate::partition::{Grid, crop, paste};

/// The grid and strip scramble strategies. Fourier phase scrambling works
/// on a grayscale spectrum and lives in [`crate::fourier`]; noise blur takes
/// its own options and lives in [`noise_blur`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Classic,
    Pixel,
    WithinBlocks,
    Rotate,
    Colormap,
    Gradient,
    Stack,
}

impl TryFrom<ScrambleKind> for Strategy {
    type Error = ScrambleError;

    fn try_from(kind: ScrambleKind) -> Result<Self> {
        match kind {
            ScrambleKind::Classic => Ok(Strategy::Classic),
            ScrambleKind::Pixel => Ok(Strategy::Pixel),
            ScrambleKind::WithinBlocks => Ok(Strategy::WithinBlocks),
            ScrambleKind::Rotate => Ok(Strategy::Rotate),
            ScrambleKind::Colormap => Ok(Strategy::Colormap),
            ScrambleKind::Gradient => Ok(Strategy::Gradient),
            ScrambleKind::Stack => Ok(Strategy::Stack),
            ScrambleKind::Fourier | ScrambleKind::NoiseBlur => Err(ScrambleError::InvalidStrategy(
                format!("{} is not a block strategy", kind),
            )),
        }
    }
}

impl Strategy {
    /// Scrambles `image` on an `x_blocks` x `y_blocks` grid.
    ///
    /// `stack` only uses `y_blocks`, as its strip count.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        image: &RgbImage,
        x_blocks: u32,
        y_blocks: u32,
        rng: &mut R,
    ) -> Result<RgbImage> {
        let (width, height) = image.dimensions();
        debug!(strategy = ?self, width, height, x_blocks, y_blocks, "applying strategy");

        let grid = || Grid::new(width, height, x_blocks, y_blocks);
        let out = match self {
            Strategy::Stack => stack::scramble(image, y_blocks, rng)?,
            Strategy::Classic => classic::scramble(image, &grid()?, rng)?,
            Strategy::Pixel => map_cells(image, &grid()?, rng, pixel::fill_cell),
            Strategy::WithinBlocks => map_cells(image, &grid()?, rng, within_blocks::shuffle_cell),
            Strategy::Rotate => map_cells(image, &grid()?, rng, rotate::rotate_cell),
            Strategy::Colormap => map_cells(image, &grid()?, rng, colormap::recolor_cell),
            Strategy::Gradient => map_cells(image, &grid()?, rng, gradient::gradient_cell),
        };
        Ok(out)
    }
}

/// Transforms every cell independently, in row-major order, writing each
/// result back to the cell's own position. Empty cells draw nothing.
fn map_cells<R, F>(image: &RgbImage, grid: &Grid, rng: &mut R, mut transform: F) -> RgbImage
where
    R: Rng + ?Sized,
    F: FnMut(&RgbImage, &mut R) -> RgbImage,
{
    let (width, height) = image.dimensions();
    let mut out = RgbImage::new(width, height);
    for rect in grid.cells().filter(|rect| !rect.is_empty()) {
        let cell = crop(image, &rect);
        let transformed = transform(&cell, rng);
        paste(&mut out, &transformed, &rect);
    }
    out
}
