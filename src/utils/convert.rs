use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use ndarray::Array2;

/// BT.601 luma of an 8-bit pixel, in `[0, 255]`.
pub fn luminance(pixel: &Rgb<u8>) -> f32 {
    let r = pixel[0] as f32;
    let g = pixel[1] as f32;
    let b = pixel[2] as f32;
    0.299 * r + 0.587 * g + 0.114 * b
}

/// Converts a color image to 8-bit grayscale with BT.601 weights.
pub fn rgb_to_gray(img: &RgbImage) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut out = ImageBuffer::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let val = luminance(pixel).round().clamp(0.0, 255.0) as u8;
        out.put_pixel(x, y, Luma([val]));
    }

    out
}

/// Expands a grayscale image into RGB by setting R=G=B=luminance.
pub fn gray_to_rgb(img: &GrayImage) -> RgbImage {
    let (width, height) = img.dimensions();
    let mut out = ImageBuffer::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let val = pixel[0];
        out.put_pixel(x, y, Rgb([val, val, val]));
    }

    out
}

/// Grayscale image as a `(height, width)` array of `f64`.
pub fn gray_to_array(img: &GrayImage) -> Array2<f64> {
    let (width, height) = img.dimensions();
    Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
        img.get_pixel(x as u32, y as u32)[0] as f64
    })
}

/// Linearly rescales `values` so the minimum maps to 0 and the maximum to 255.
///
/// A constant input has no range to stretch and maps to all zeros.
pub fn normalize_min_max<'a, I>(values: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a f64>,
    I::IntoIter: Clone,
{
    let iter = values.into_iter();
    let (min, max) = iter
        .clone()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;

    iter.map(|&v| {
        if range > 0.0 && range.is_finite() {
            ((v - min) / range * 255.0).round().clamp(0.0, 255.0) as u8
        } else {
            0
        }
    })
    .collect()
}

/// Min-max normalises a `(height, width)` array into an 8-bit grayscale image.
pub fn array_to_gray_normalized(data: &Array2<f64>) -> GrayImage {
    let (height, width) = data.dim();
    let bytes = normalize_min_max(data.iter());
    // Array iteration is in logical (row-major) order, matching the image layout.
    GrayImage::from_fn(width as u32, height as u32, |x, y| {
        Luma([bytes[y as usize * width + x as usize]])
    })
}
