//! Rectangular grid partitioning of image buffers and the inverse reassembly.
//!
//! Cell boundaries along an axis of length `dim` split into `blocks` parts are
//! `floor(dim * i / blocks)` for `i` in `0..=blocks`, so the cells cover the
//! buffer exactly, never overlap, and the last cell ends at `dim`. With more
//! blocks than pixels along an axis some cells are empty.

use image::{ImageBuffer, Pixel};

use crate::error::{Result, ScrambleError};

/// Owned image buffer of any pixel type.
pub type Buffer<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;

/// Position and extent of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub row: u32,
    pub col: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CellRect {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A `y_blocks` x `x_blocks` partition of a `width` x `height` buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    x_blocks: u32,
    y_blocks: u32,
}

fn boundary(dim: u32, blocks: u32, i: u32) -> u32 {
    (dim as u64 * i as u64 / blocks as u64) as u32
}

impl Grid {
    /// Both split counts must be at least one.
    pub fn new(width: u32, height: u32, x_blocks: u32, y_blocks: u32) -> Result<Self> {
        if x_blocks == 0 || y_blocks == 0 {
            return Err(ScrambleError::InvalidParameter(format!(
                "split counts must be positive, got {}x{}",
                x_blocks, y_blocks
            )));
        }
        Ok(Self {
            width,
            height,
            x_blocks,
            y_blocks,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn x_blocks(&self) -> u32 {
        self.x_blocks
    }

    pub fn y_blocks(&self) -> u32 {
        self.y_blocks
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.x_blocks as usize * self.y_blocks as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cell(&self, row: u32, col: u32) -> CellRect {
        let x = boundary(self.width, self.x_blocks, col);
        let y = boundary(self.height, self.y_blocks, row);
        CellRect {
            row,
            col,
            x,
            y,
            width: boundary(self.width, self.x_blocks, col + 1) - x,
            height: boundary(self.height, self.y_blocks, row + 1) - y,
        }
    }

    /// Cells in row-major order; the index of a cell is `row * x_blocks + col`.
    pub fn cells(&self) -> impl Iterator<Item = CellRect> + '_ {
        (0..self.y_blocks).flat_map(move |row| (0..self.x_blocks).map(move |col| self.cell(row, col)))
    }
}

/// The content of one grid cell together with its grid position.
#[derive(Clone)]
pub struct Cell<P: Pixel> {
    pub row: u32,
    pub col: u32,
    pub buffer: Buffer<P>,
}

impl<P: Pixel> Cell<P> {
    /// The cell content cropped or edge-extended to `width` x `height`.
    /// An empty cell has nothing to extend and yields a zeroed buffer.
    pub fn fitted(&self, width: u32, height: u32) -> Buffer<P> {
        let (w, h) = self.buffer.dimensions();
        if (w, h) == (width, height) {
            return self.buffer.clone();
        }
        if w == 0 || h == 0 {
            return ImageBuffer::new(width, height);
        }
        ImageBuffer::from_fn(width, height, |x, y| {
            *self.buffer.get_pixel(x.min(w - 1), y.min(h - 1))
        })
    }
}

/// Copies the region `rect` out of `buffer`.
pub fn crop<P: Pixel>(buffer: &Buffer<P>, rect: &CellRect) -> Buffer<P> {
    ImageBuffer::from_fn(rect.width, rect.height, |x, y| {
        *buffer.get_pixel(rect.x + x, rect.y + y)
    })
}

/// Writes `cell` into `target` with its top-left corner at `rect`.
pub fn paste<P: Pixel>(target: &mut Buffer<P>, cell: &Buffer<P>, rect: &CellRect) {
    for (x, y, pixel) in cell.enumerate_pixels() {
        target.put_pixel(rect.x + x, rect.y + y, *pixel);
    }
}

/// Splits `buffer` into `y_blocks` rows of `x_blocks` cells, row-major.
pub fn partition<P: Pixel>(buffer: &Buffer<P>, x_blocks: u32, y_blocks: u32) -> Result<Vec<Cell<P>>> {
    let (width, height) = buffer.dimensions();
    let grid = Grid::new(width, height, x_blocks, y_blocks)?;
    Ok(partition_grid(buffer, &grid))
}

pub(crate) fn partition_grid<P: Pixel>(buffer: &Buffer<P>, grid: &Grid) -> Vec<Cell<P>> {
    grid.cells()
        .map(|rect| Cell {
            row: rect.row,
            col: rect.col,
            buffer: crop(buffer, &rect),
        })
        .collect()
}

/// Places every cell at its `(row, col)` position of `grid`.
///
/// Each cell must have exactly the size of the grid cell it belongs to.
/// Positions without a cell stay zeroed.
pub fn reassemble<P: Pixel>(cells: &[Cell<P>], grid: &Grid) -> Result<Buffer<P>> {
    let (width, height) = grid.dimensions();
    let mut out: Buffer<P> = ImageBuffer::new(width, height);

    for cell in cells {
        if cell.row >= grid.y_blocks() || cell.col >= grid.x_blocks() {
            return Err(ScrambleError::InvalidParameter(format!(
                "cell ({}, {}) lies outside a {}x{} grid",
                cell.row,
                cell.col,
                grid.y_blocks(),
                grid.x_blocks()
            )));
        }
        let rect = grid.cell(cell.row, cell.col);
        if cell.buffer.dimensions() != (rect.width, rect.height) {
            return Err(ScrambleError::InvalidParameter(format!(
                "cell ({}, {}) is {:?}, expected {}x{}",
                cell.row,
                cell.col,
                cell.buffer.dimensions(),
                rect.width,
                rect.height
            )));
        }
        paste(&mut out, &cell.buffer, &rect);
    }

    Ok(out)
}
