//! Block, strip and Fourier-phase scrambling of images, optionally confined
//! to a detected face.

pub mod compositor;
pub mod config;
pub mod detector;
pub mod error;
pub mod fourier;
pub mod image_handler;
pub mod mask;
pub mod partition;
pub mod pipeline;
pub mod strategies;
pub mod utils;
pub mod video;

pub use config::{NoiseBlurOptions, ScrambleConfig, ScrambleKind};
pub use detector::{FixedLandmarks, LandmarkDetector, Landmarks};
pub use error::{Result, ScrambleError};
pub use pipeline::{BatchResult, Emitted, Scrambler};
pub use video::{FrameSink, FrameSource, VideoReport, scramble_video};
