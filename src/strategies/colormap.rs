//! False-color remapping of cell luminance through a randomly chosen palette.

use image::{Rgb, RgbImage};
use rand::Rng;

use crate::utils::convert::luminance;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Autumn,
    Bone,
    Jet,
    Winter,
    Rainbow,
    Ocean,
}

impl Palette {
    pub const ALL: [Palette; 6] = [
        Palette::Autumn,
        Palette::Bone,
        Palette::Jet,
        Palette::Winter,
        Palette::Rainbow,
        Palette::Ocean,
    ];

    /// Color of intensity `t` in `[0, 1]` as `[r, g, b]` in `[0, 1]`.
    fn sample(&self, t: f32) -> [f32; 3] {
        let c = |v: f32| v.clamp(0.0, 1.0);
        match self {
            Palette::Autumn => [1.0, t, 0.0],
            Palette::Bone => {
                // (7 * gray + reversed hot) / 8
                let hot_r = c(t / 0.375);
                let hot_g = c((t - 0.375) / 0.375);
                let hot_b = c((t - 0.75) / 0.25);
                [
                    (7.0 * t + hot_b) / 8.0,
                    (7.0 * t + hot_g) / 8.0,
                    (7.0 * t + hot_r) / 8.0,
                ]
            }
            Palette::Jet => [
                c(1.5 - (4.0 * t - 3.0).abs()),
                c(1.5 - (4.0 * t - 2.0).abs()),
                c(1.5 - (4.0 * t - 1.0).abs()),
            ],
            Palette::Winter => [0.0, t, 1.0 - 0.5 * t],
            Palette::Rainbow => hue_to_rgb(t * 270.0),
            Palette::Ocean => [c(3.0 * t - 2.0), c(((3.0 * t - 1.0) / 2.0).abs()), t],
        }
    }

    /// 256-entry lookup table.
    pub fn lut(&self) -> [Rgb<u8>; 256] {
        let mut table = [Rgb([0, 0, 0]); 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let [r, g, b] = self.sample(i as f32 / 255.0);
            *entry = Rgb([to_u8(r), to_u8(g), to_u8(b)]);
        }
        table
    }
}

fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Fully saturated color of hue `degrees`.
fn hue_to_rgb(degrees: f32) -> [f32; 3] {
    let h = (degrees / 60.0).rem_euclid(6.0);
    let x = 1.0 - (h % 2.0 - 1.0).abs();
    match h as u32 {
        0 => [1.0, x, 0.0],
        1 => [x, 1.0, 0.0],
        2 => [0.0, 1.0, x],
        3 => [0.0, x, 1.0],
        4 => [x, 0.0, 1.0],
        _ => [1.0, 0.0, x],
    }
}

/// Maps each pixel's luminance through `palette`.
pub fn apply_palette(cell: &RgbImage, palette: Palette) -> RgbImage {
    let lut = palette.lut();
    let (width, height) = cell.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let level = luminance(cell.get_pixel(x, y)).round().clamp(0.0, 255.0) as usize;
        lut[level]
    })
}

pub fn recolor_cell<R: Rng + ?Sized>(cell: &RgbImage, rng: &mut R) -> RgbImage {
    let palette = Palette::ALL[rng.random_range(0..Palette::ALL.len())];
    apply_palette(cell, palette)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::rng::scramble_rng;

    #[test]
    fn test_palette_endpoints() {
        assert_eq!(Palette::Autumn.lut()[0], Rgb([255, 0, 0]));
        assert_eq!(Palette::Autumn.lut()[255], Rgb([255, 255, 0]));
        assert_eq!(Palette::Winter.lut()[0], Rgb([0, 0, 255]));
        assert_eq!(Palette::Winter.lut()[255], Rgb([0, 255, 128]));
        assert_eq!(Palette::Bone.lut()[0], Rgb([0, 0, 0]));
        assert_eq!(Palette::Bone.lut()[255], Rgb([255, 255, 255]));
        assert_eq!(Palette::Jet.lut()[0], Rgb([0, 0, 128]));
        assert_eq!(Palette::Jet.lut()[255], Rgb([128, 0, 0]));
        assert_eq!(Palette::Rainbow.lut()[0], Rgb([255, 0, 0]));
        assert_eq!(Palette::Ocean.lut()[255], Rgb([255, 255, 255]));
    }

    #[test]
    fn test_bone_is_bluish_in_the_shadows() {
        let mid = Palette::Bone.lut()[80];
        assert!(mid[2] > mid[0]);
    }

    #[test]
    fn test_flat_cell_maps_to_one_color() {
        let cell = RgbImage::from_pixel(6, 4, Rgb([90, 90, 90]));
        let out = apply_palette(&cell, Palette::Jet);
        assert_eq!(*out.get_pixel(0, 0), Palette::Jet.lut()[90]);
        assert!(out.pixels().all(|p| *p == *out.get_pixel(0, 0)));
    }

    #[test]
    fn test_recolor_output_comes_from_a_palette() {
        let cell = RgbImage::from_pixel(3, 3, Rgb([10, 200, 30]));
        let out = recolor_cell(&cell, &mut scramble_rng(Some(6)));
        let level = luminance(&Rgb([10, 200, 30])).round() as usize;
        let color = *out.get_pixel(1, 1);
        assert!(Palette::ALL.iter().any(|p| p.lut()[level] == color));
    }
}
