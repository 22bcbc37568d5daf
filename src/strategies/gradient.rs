//! Edge-response remapping: each cell is replaced by either its Sobel
//! gradient magnitude or its Laplacian, stretched to the full 8-bit range.

use image::{Rgb, RgbImage};
use ndarray::{Array2, array};
use rand::Rng;

use crate::utils::convert::normalize_min_max;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeFilter {
    /// 5x5 Sobel, magnitude of the x and y derivatives.
    Sobel,
    /// 3x3 Laplacian.
    Laplacian,
}

/// Reflect-101 border index (`dcb|abcd|cba`).
pub(crate) fn reflect_101(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * len as isize - 2;
    let i = i.rem_euclid(period);
    if i < len as isize {
        i as usize
    } else {
        (period - i) as usize
    }
}

/// Cross-correlates `data` with an odd-sized `kernel`.
pub(crate) fn correlate(data: &Array2<f64>, kernel: &Array2<f64>) -> Array2<f64> {
    let (height, width) = data.dim();
    let (kh, kw) = kernel.dim();
    let (ry, rx) = ((kh / 2) as isize, (kw / 2) as isize);

    Array2::from_shape_fn((height, width), |(y, x)| {
        let mut acc = 0.0;
        for ((ky, kx), &k) in kernel.indexed_iter() {
            if k == 0.0 {
                continue;
            }
            let sy = reflect_101(y as isize + ky as isize - ry, height);
            let sx = reflect_101(x as isize + kx as isize - rx, width);
            acc += k * data[[sy, sx]];
        }
        acc
    })
}

fn sobel_kernels() -> (Array2<f64>, Array2<f64>) {
    let smooth = array![1.0, 4.0, 6.0, 4.0, 1.0];
    let deriv = array![-1.0, -2.0, 0.0, 2.0, 1.0];
    let kx = Array2::from_shape_fn((5, 5), |(y, x)| smooth[y] * deriv[x]);
    let ky = kx.t().to_owned();
    (kx, ky)
}

impl EdgeFilter {
    /// Edge response of one channel.
    pub fn response(&self, channel: &Array2<f64>) -> Array2<f64> {
        match self {
            EdgeFilter::Sobel => {
                let (kx, ky) = sobel_kernels();
                let gx = correlate(channel, &kx);
                let gy = correlate(channel, &ky);
                ndarray::Zip::from(&gx)
                    .and(&gy)
                    .map_collect(|&a, &b| (a * a + b * b).sqrt())
            }
            EdgeFilter::Laplacian => {
                let kernel = array![[0.0, 1.0, 0.0], [1.0, -4.0, 1.0], [0.0, 1.0, 0.0]];
                correlate(channel, &kernel)
            }
        }
    }
}

/// Filters every channel of `cell` and min-max normalises the responses of
/// all channels together into `[0, 255]`.
pub fn apply_filter(cell: &RgbImage, filter: EdgeFilter) -> RgbImage {
    let (width, height) = cell.dimensions();
    let (w, h) = (width as usize, height as usize);

    let responses: Vec<Array2<f64>> = (0..3)
        .map(|c| {
            let channel =
                Array2::from_shape_fn((h, w), |(y, x)| cell.get_pixel(x as u32, y as u32)[c] as f64);
            filter.response(&channel)
        })
        .collect();

    // Interleave back to the RGB memory layout before normalising.
    let mut interleaved = Vec::with_capacity(w * h * 3);
    for y in 0..h {
        for x in 0..w {
            for response in &responses {
                interleaved.push(response[[y, x]]);
            }
        }
    }
    let bytes = normalize_min_max(interleaved.iter());
    RgbImage::from_fn(width, height, |x, y| {
        let i = (y as usize * w + x as usize) * 3;
        Rgb([bytes[i], bytes[i + 1], bytes[i + 2]])
    })
}

pub fn gradient_cell<R: Rng + ?Sized>(cell: &RgbImage, rng: &mut R) -> RgbImage {
    let filter = if rng.random_range(0..2) == 0 {
        EdgeFilter::Sobel
    } else {
        EdgeFilter::Laplacian
    };
    apply_filter(cell, filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::rng::scramble_rng;

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(3, 1), 0);
    }

    #[test]
    fn test_flat_cell_has_no_edges() {
        let cell = RgbImage::from_pixel(8, 8, Rgb([70, 70, 70]));
        for filter in [EdgeFilter::Sobel, EdgeFilter::Laplacian] {
            let out = apply_filter(&cell, filter);
            assert!(out.pixels().all(|p| p.0 == [0, 0, 0]));
        }
    }

    #[test]
    fn test_sobel_peaks_on_vertical_edge() {
        let cell = RgbImage::from_fn(12, 6, |x, _| {
            if x < 6 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        let out = apply_filter(&cell, EdgeFilter::Sobel);
        assert_eq!(out.get_pixel(5, 3)[0], 255);
        assert_eq!(out.get_pixel(0, 3)[0], 0);
        assert_eq!(out.get_pixel(11, 3)[0], 0);
    }

    #[test]
    fn test_output_spans_full_range() {
        let cell = RgbImage::from_fn(10, 10, |x, y| Rgb([(x * 25) as u8, (y * 13) as u8, 9]));
        let out = gradient_cell(&cell, &mut scramble_rng(Some(17)));
        let max = out.as_raw().iter().copied().max().unwrap();
        let min = out.as_raw().iter().copied().min().unwrap();
        assert_eq!((min, max), (0, 255));
    }
}
