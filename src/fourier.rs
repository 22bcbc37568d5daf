//! Fourier phase scrambling.
//!
//! The grayscale buffer is taken to the centred frequency domain, the phase
//! of every coefficient is pulled towards a uniformly random phase by
//! `ratio`, the magnitude is kept, and the result is transformed back and
//! min-max normalised to 8 bits.

use std::f64::consts::{PI, TAU};
use std::sync::Arc;

use image::GrayImage;
use ndarray::{Array2, Axis};
use rand::Rng;
use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use tracing::debug;

use crate::config::validate_ratio;
use crate::error::Result;
use crate::utils::convert::{array_to_gray_normalized, gray_to_array};

/// Forward and inverse plans for one `(height, width)` shape.
struct Plans {
    row_fwd: Arc<dyn Fft<f64>>,
    row_inv: Arc<dyn Fft<f64>>,
    col_fwd: Arc<dyn Fft<f64>>,
    col_inv: Arc<dyn Fft<f64>>,
}

impl Plans {
    fn new(height: usize, width: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            row_fwd: planner.plan_fft_forward(width),
            row_inv: planner.plan_fft_inverse(width),
            col_fwd: planner.plan_fft_forward(height),
            col_inv: planner.plan_fft_inverse(height),
        }
    }
}

/// Runs `row` over every row and `col` over every column of `data`.
fn transform_2d(data: &mut Array2<Complex64>, row: &dyn Fft<f64>, col: &dyn Fft<f64>) {
    let (height, width) = data.dim();

    let mut buf = vec![Complex64::new(0.0, 0.0); width];
    for mut lane in data.axis_iter_mut(Axis(0)) {
        for (dst, src) in buf.iter_mut().zip(lane.iter()) {
            *dst = *src;
        }
        row.process(&mut buf);
        for (dst, src) in lane.iter_mut().zip(buf.iter()) {
            *dst = *src;
        }
    }

    let mut buf = vec![Complex64::new(0.0, 0.0); height];
    for mut lane in data.axis_iter_mut(Axis(1)) {
        for (dst, src) in buf.iter_mut().zip(lane.iter()) {
            *dst = *src;
        }
        col.process(&mut buf);
        for (dst, src) in lane.iter_mut().zip(buf.iter()) {
            *dst = *src;
        }
    }
}

/// Moves the zero-frequency term to the centre (`inverse` undoes it).
fn shift(data: &Array2<Complex64>, inverse: bool) -> Array2<Complex64> {
    let (height, width) = data.dim();
    let (dy, dx) = if inverse {
        (height - height / 2, width - width / 2)
    } else {
        (height / 2, width / 2)
    };
    let mut out = Array2::zeros((height, width));
    for ((y, x), v) in data.indexed_iter() {
        out[[(y + dy) % height, (x + dx) % width]] = *v;
    }
    out
}

/// Replaces each coefficient's phase `p` by `(1 - ratio) * p + ratio * r`
/// with `r` uniform in `[-pi, pi)`, keeping its magnitude. Random phases are
/// drawn in row-major order.
pub fn randomize_phase<R: Rng + ?Sized>(spectrum: &mut Array2<Complex64>, ratio: f64, rng: &mut R) {
    for coeff in spectrum.iter_mut() {
        let random: f64 = TAU * rng.random::<f64>() - PI;
        let (magnitude, phase) = coeff.to_polar();
        let phase = (1.0 - ratio) * phase + ratio * random;
        *coeff = Complex64::from_polar(magnitude, phase);
    }
}

/// Phase-scrambles `gray` by `ratio` in `[0, 1]`.
///
/// A ratio of 0 reproduces the input up to normalisation and rounding; a
/// ratio of 1 keeps only the amplitude spectrum.
pub fn fourier_scramble<R: Rng + ?Sized>(gray: &GrayImage, ratio: f64, rng: &mut R) -> Result<GrayImage> {
    validate_ratio(ratio)?;
    let (width, height) = gray.dimensions();
    debug!(width, height, ratio, "fourier phase scramble");
    if width == 0 || height == 0 {
        return Ok(GrayImage::new(width, height));
    }

    let field = scrambled_field(&gray_to_array(gray), ratio, rng);
    let real = field.mapv(|c| c.re);
    Ok(array_to_gray_normalized(&real))
}

/// Complex spatial field whose spectrum has the magnitude of `data` and the
/// interpolated phase. Its real part is the scrambled image before
/// normalisation.
fn scrambled_field<R: Rng + ?Sized>(data: &Array2<f64>, ratio: f64, rng: &mut R) -> Array2<Complex64> {
    let (h, w) = data.dim();
    let plans = Plans::new(h, w);

    let mut spectrum = data.mapv(|v| Complex64::new(v, 0.0));
    transform_2d(&mut spectrum, plans.row_fwd.as_ref(), plans.col_fwd.as_ref());

    let mut centred = shift(&spectrum, false);
    randomize_phase(&mut centred, ratio, rng);
    let mut spectrum = shift(&centred, true);

    transform_2d(&mut spectrum, plans.row_inv.as_ref(), plans.col_inv.as_ref());
    let scale = 1.0 / (h * w) as f64;
    spectrum.mapv_inplace(|c| c * scale);
    spectrum
}
