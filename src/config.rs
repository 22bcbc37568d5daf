//! Scramble configuration: the closed set of strategies and the per-call
//! options record.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrambleError};

/// Every scramble strategy the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrambleKind {
    /// Shuffle whole cells of the grid.
    Classic,
    /// Fill every cell with one randomly picked pixel of that cell.
    Pixel,
    /// Permute rows and columns inside each cell.
    WithinBlocks,
    /// Rotate each cell about its centre by a random angle.
    Rotate,
    /// Remap each cell through a randomly chosen false-color palette.
    Colormap,
    /// Replace each cell by a normalised Sobel or Laplacian response.
    Gradient,
    /// Shuffle horizontal strips of the buffer.
    Stack,
    /// Fourier phase scrambling of the grayscale buffer.
    Fourier,
    /// Repeated Gaussian noise followed by a Gaussian blur.
    NoiseBlur,
}

impl ScrambleKind {
    pub const ALL: [ScrambleKind; 9] = [
        ScrambleKind::Classic,
        ScrambleKind::Pixel,
        ScrambleKind::WithinBlocks,
        ScrambleKind::Rotate,
        ScrambleKind::Colormap,
        ScrambleKind::Gradient,
        ScrambleKind::Stack,
        ScrambleKind::Fourier,
        ScrambleKind::NoiseBlur,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScrambleKind::Classic => "classic",
            ScrambleKind::Pixel => "pixel",
            ScrambleKind::WithinBlocks => "withinblocks",
            ScrambleKind::Rotate => "rotate",
            ScrambleKind::Colormap => "colormap",
            ScrambleKind::Gradient => "gradient",
            ScrambleKind::Stack => "stack",
            ScrambleKind::Fourier => "fourier",
            ScrambleKind::NoiseBlur => "noiseblur",
        }
    }
}

impl fmt::Display for ScrambleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScrambleKind {
    type Err = ScrambleError;

    fn from_str(s: &str) -> Result<Self> {
        ScrambleKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ScrambleError::InvalidStrategy(s.to_string()))
    }
}

/// Parameters of the noise-and-blur scramble.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseBlurOptions {
    /// Noise then blur rounds.
    pub cycles: u32,
    /// Side of the square Gaussian kernel; odd.
    pub kernel: u32,
    /// Gaussian standard deviation. Zero derives it from `kernel`.
    pub sigma: f64,
}

impl Default for NoiseBlurOptions {
    fn default() -> Self {
        Self {
            cycles: 5,
            kernel: 3,
            sigma: 10.0,
        }
    }
}

impl NoiseBlurOptions {
    pub fn validate(&self) -> Result<()> {
        if self.kernel % 2 == 0 {
            return Err(ScrambleError::InvalidParameter(format!(
                "blur kernel must be odd, got {}",
                self.kernel
            )));
        }
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(ScrambleError::InvalidParameter(format!(
                "blur sigma must be a non-negative number, got {}",
                self.sigma
            )));
        }
        Ok(())
    }
}

/// Options for one scramble call. Read-only for the duration of the call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrambleConfig {
    pub kind: ScrambleKind,
    /// Number of splits along the x axis.
    pub x_blocks: u32,
    /// Number of splits along the y axis (also the strip count of `stack`).
    pub y_blocks: u32,
    /// Blend the scrambled face into the original with Poisson cloning.
    pub seamless: bool,
    /// Keep the original background; when false it is flat gray.
    pub background: bool,
    pub seed: Option<u64>,
    /// Persist results to disk instead of returning them.
    pub write: bool,
    /// Fourier phase scramble ratio in `[0, 1]`.
    pub ratio: f64,
    /// Directory for face-mode outputs; defaults to the input's directory.
    pub output_dir: Option<PathBuf>,
    pub noise_blur: NoiseBlurOptions,
}

impl Default for ScrambleConfig {
    fn default() -> Self {
        Self {
            kind: ScrambleKind::Classic,
            x_blocks: 10,
            y_blocks: 10,
            seamless: false,
            background: true,
            seed: None,
            write: true,
            ratio: 1.0,
            output_dir: None,
            noise_blur: NoiseBlurOptions::default(),
        }
    }
}

impl ScrambleConfig {
    pub fn new(kind: ScrambleKind, x_blocks: u32, y_blocks: u32) -> Self {
        Self {
            kind,
            x_blocks,
            y_blocks,
            ..Self::default()
        }
    }

    /// Checks every option before any buffer is touched.
    pub fn validate(&self) -> Result<()> {
        if self.x_blocks == 0 || self.y_blocks == 0 {
            return Err(ScrambleError::InvalidParameter(format!(
                "split counts must be positive, got {}x{}",
                self.x_blocks, self.y_blocks
            )));
        }
        validate_ratio(self.ratio)?;
        self.noise_blur.validate()?;
        if self.seamless && !self.background {
            return Err(ScrambleError::Configuration(
                "seamless blending requires the background to be kept".into(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_ratio(ratio: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&ratio) {
        return Err(ScrambleError::InvalidParameter(format!(
            "scramble ratio must be between 0 and 1, got {}",
            ratio
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_selector() {
        for kind in ScrambleKind::ALL {
            assert_eq!(kind.as_str().parse::<ScrambleKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_parse_unknown_selector() {
        let result = "swirl".parse::<ScrambleKind>();
        assert_eq!(
            result.unwrap_err(),
            ScrambleError::InvalidStrategy("swirl".into())
        );
        // Selectors are case sensitive.
        assert!("Classic".parse::<ScrambleKind>().is_err());
    }

    #[test]
    fn test_default_is_valid() {
        assert!(ScrambleConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_blocks_rejected() {
        let config = ScrambleConfig::new(ScrambleKind::Classic, 0, 4);
        assert!(matches!(
            config.validate(),
            Err(ScrambleError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_ratio_bounds() {
        let mut config = ScrambleConfig::new(ScrambleKind::Fourier, 1, 1);
        config.ratio = 0.0;
        assert!(config.validate().is_ok());
        config.ratio = 1.0;
        assert!(config.validate().is_ok());
        config.ratio = 1.01;
        assert!(config.validate().is_err());
        config.ratio = -0.1;
        assert!(config.validate().is_err());
        config.ratio = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_seamless_without_background_rejected() {
        let config = ScrambleConfig {
            seamless: true,
            background: false,
            ..ScrambleConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ScrambleError::Configuration(_))
        ));
    }

    #[test]
    fn test_settings_json_uses_defaults_for_missing_fields() {
        let config: ScrambleConfig =
            serde_json::from_str(r#"{"kind": "withinblocks", "x_blocks": 4, "seed": 7}"#).unwrap();
        assert_eq!(config.kind, ScrambleKind::WithinBlocks);
        assert_eq!(config.x_blocks, 4);
        assert_eq!(config.y_blocks, 10);
        assert_eq!(config.seed, Some(7));
        assert!(config.background);
        assert_eq!(config.noise_blur, NoiseBlurOptions::default());
    }

    #[test]
    fn test_noise_blur_options() {
        let config: ScrambleConfig = serde_json::from_str(
            r#"{"kind": "noiseblur", "noise_blur": {"cycles": 2, "kernel": 5}}"#,
        )
        .unwrap();
        assert_eq!(config.kind, ScrambleKind::NoiseBlur);
        assert_eq!(config.noise_blur.cycles, 2);
        assert_eq!(config.noise_blur.kernel, 5);
        assert_eq!(config.noise_blur.sigma, 10.0);
        assert!(config.validate().is_ok());

        let mut config = config;
        config.noise_blur.kernel = 4;
        assert!(matches!(
            config.validate(),
            Err(ScrambleError::InvalidParameter(_))
        ));
        config.noise_blur.kernel = 3;
        config.noise_blur.sigma = -1.0;
        assert!(config.validate().is_err());
    }
}
