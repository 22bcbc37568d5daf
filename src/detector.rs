//! Face landmark input.
//!
//! The landmark model itself lives outside this crate. Anything that can turn
//! a frame into face meshes implements [`LandmarkDetector`]; the engine only
//! ever uses the first face it reports.

use std::path::Path;

use image::RgbImage;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, ScrambleError};

/// Number of points in one face mesh.
pub const LANDMARK_COUNT: usize = 468;

/// One face: exactly [`LANDMARK_COUNT`] integer pixel coordinates `(x, y)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Landmarks(Vec<(i32, i32)>);

impl Landmarks {
    pub fn new(points: Vec<(i32, i32)>) -> Result<Self> {
        if points.len() != LANDMARK_COUNT {
            return Err(ScrambleError::InvalidParameter(format!(
                "a face mesh needs {} landmarks, got {}",
                LANDMARK_COUNT,
                points.len()
            )));
        }
        Ok(Self(points))
    }

    /// Builds landmarks from model output normalised to `[0, 1]`, truncating
    /// `x * width` and `y * height` to whole pixels.
    pub fn from_normalized(points: &[(f32, f32)], width: u32, height: u32) -> Result<Self> {
        let pixels = points
            .iter()
            .map(|&(x, y)| ((x * width as f32) as i32, (y * height as f32) as i32))
            .collect();
        Self::new(pixels)
    }

    pub fn points(&self) -> &[(i32, i32)] {
        &self.0
    }
}

/// A source of face meshes for a frame.
pub trait LandmarkDetector {
    /// Returns every face found in `image`, possibly none.
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Landmarks>>;
}

/// Runs `detector` and keeps the first face.
///
/// Zero faces is reported as [`ScrambleError::NoFaceDetected`], never as an
/// empty landmark set.
pub fn detect_first_face(
    detector: &mut dyn LandmarkDetector,
    image: &RgbImage,
) -> Result<Landmarks> {
    let faces = detector.detect(image)?;
    debug!(faces = faces.len(), "landmark detection finished");
    faces.into_iter().next().ok_or(ScrambleError::NoFaceDetected)
}

/// A detector that reports the same faces for every frame.
#[derive(Debug, Clone, Default)]
pub struct FixedLandmarks {
    faces: Vec<Landmarks>,
}

#[derive(Deserialize)]
struct LandmarkDocument {
    faces: Vec<Vec<[i32; 2]>>,
}

impl FixedLandmarks {
    pub fn new(faces: Vec<Landmarks>) -> Self {
        Self { faces }
    }

    /// Parses `{"faces": [[[x, y], ...], ...]}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: LandmarkDocument = serde_json::from_str(json)?;
        let faces = doc
            .faces
            .into_iter()
            .map(|face| Landmarks::new(face.into_iter().map(|[x, y]| (x, y)).collect()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { faces })
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

impl LandmarkDetector for FixedLandmarks {
    fn detect(&mut self, _image: &RgbImage) -> Result<Vec<Landmarks>> {
        Ok(self.faces.clone())
    }
}

/// Landmarks spread evenly over an ellipse, for tests.
#[cfg(test)]
pub(crate) fn ellipse_landmarks(cx: f64, cy: f64, rx: f64, ry: f64) -> Landmarks {
    let points = (0..LANDMARK_COUNT)
        .map(|i| {
            let t = i as f64 / LANDMARK_COUNT as f64 * std::f64::consts::TAU;
            (
                (cx + rx * t.cos()).round() as i32,
                (cy + ry * t.sin()).round() as i32,
            )
        })
        .collect();
    Landmarks(points)
}
