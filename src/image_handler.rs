use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbImage};

use crate::config::{ScrambleConfig, ScrambleKind};
use crate::error::Result;

/// Extensions picked up by directory batches.
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Load image from bytes (supports PNG, JPEG, BMP, etc.)
pub fn load_image_from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

/// Reads and decodes the file at `path` into an RGB buffer.
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let bytes = std::fs::read(path)?;
    Ok(load_image_from_bytes(&bytes)?.to_rgb8())
}

/// Writes `image` to `path`; the format follows the extension.
pub fn save_image(path: &Path, image: &DynamicImage) -> Result<()> {
    image.save(path)?;
    Ok(())
}

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Formats a ratio the way it appears in output names (`1.0`, `0.5`).
pub fn format_ratio(ratio: f64) -> String {
    format!("{:?}", ratio)
}

fn file_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Output path of a whole-image scramble: the input path with its
/// extension replaced by the scramble suffix.
pub fn whole_image_output(input: &Path, config: &ScrambleConfig) -> PathBuf {
    let suffix = match config.kind {
        ScrambleKind::Fourier => format!("_SCRAMBLED_fourier_{}.png", format_ratio(config.ratio)),
        ScrambleKind::NoiseBlur => format!("_SCRAMBLED_noiseblur_{}.png", config.noise_blur.cycles),
        _ => format!("_SCRAMBLED_{}_{}.png", config.x_blocks, config.y_blocks),
    };
    let base = input.with_extension("");
    PathBuf::from(format!("{}{}", base.display(), suffix))
}

/// Output path of a face scramble, inside `config.output_dir` or next to
/// the input.
pub fn face_output(input: &Path, config: &ScrambleConfig) -> PathBuf {
    let stem = file_stem(input);
    let mode = if config.seamless {
        "_seamless"
    } else if !config.background {
        "_nobg"
    } else {
        ""
    };

    let name = match config.kind {
        ScrambleKind::Fourier => format!(
            "{}SCRAMBLED_fourier_{}{}{}.png",
            stem,
            format_ratio(config.ratio),
            if config.seamless { "_seamless" } else { "" },
            if config.background { "" } else { "_nobg" },
        ),
        ScrambleKind::Stack => format!("{}_SCRAMBLED{}_{}.png", stem, mode, config.y_blocks),
        ScrambleKind::NoiseBlur => format!(
            "{}_SCRAMBLED{}_noiseblur_{}.png",
            stem, mode, config.noise_blur.cycles
        ),
        _ => format!(
            "{}_SCRAMBLED{}_{}_{}.png",
            stem, mode, config.x_blocks, config.y_blocks
        ),
    };

    let dir = match &config.output_dir {
        Some(dir) => dir.clone(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    dir.join(name)
}
