//! Sequential frame-by-frame face scrambling.
//!
//! Decoding and encoding sit behind [`FrameSource`] and [`FrameSink`]; the
//! `ffmpeg` feature provides file-backed implementations.

#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;

use std::collections::VecDeque;

use image::RgbImage;
use tracing::{info, warn};

use crate::config::ScrambleConfig;
use crate::detector::LandmarkDetector;
use crate::error::{Result, ScrambleError};
use crate::pipeline::Scrambler;

/// Produces decoded frames in presentation order.
pub trait FrameSource {
    /// Frames per second of the stream.
    fn frame_rate(&self) -> f64;

    fn dimensions(&self) -> (u32, u32);

    /// The next frame, or `None` once the stream is exhausted.
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;
}

/// Consumes frames in order.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;

    /// Flushes and closes the output. Called once after the last frame.
    fn finish(&mut self) -> Result<()>;
}

/// Frames held in memory.
#[derive(Debug, Clone)]
pub struct MemoryFrames {
    frames: VecDeque<RgbImage>,
    frame_rate: f64,
    dimensions: (u32, u32),
}

impl MemoryFrames {
    /// All frames must share one size.
    pub fn new(frames: Vec<RgbImage>, frame_rate: f64) -> Result<Self> {
        let dimensions = frames.first().map(|f| f.dimensions()).unwrap_or((0, 0));
        if let Some(bad) = frames.iter().find(|f| f.dimensions() != dimensions) {
            return Err(ScrambleError::Video(format!(
                "frame of size {:?} in a {:?} stream",
                bad.dimensions(),
                dimensions
            )));
        }
        Ok(Self {
            frames: frames.into(),
            frame_rate,
            dimensions,
        })
    }
}

impl FrameSource for MemoryFrames {
    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        Ok(self.frames.pop_front())
    }
}

/// Collects written frames.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub frames: Vec<RgbImage>,
    pub finished: bool,
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

/// Frame counts of one video run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoReport {
    pub frames: usize,
    pub scrambled: usize,
    /// Frames emitted unchanged because scrambling them failed.
    pub passed_through: usize,
}

/// Scrambles the face in every frame of `source`, writing each result to
/// `sink` when one is given.
///
/// Frames are never persisted individually, so `write` is ignored. With a
/// seed every frame is scrambled with the same random draws. A frame
/// that cannot be scrambled (no face, degenerate mask) is emitted unchanged
/// and the stream continues. Decoding and encoding errors abort the run.
pub fn scramble_video(
    source: &mut dyn FrameSource,
    mut sink: Option<&mut dyn FrameSink>,
    detector: &mut dyn LandmarkDetector,
    config: &ScrambleConfig,
) -> Result<VideoReport> {
    let mut config = config.clone();
    if config.write {
        warn!("per-frame writing is not supported for video, returning frames instead");
        config.write = false;
    }
    let mut scrambler = Scrambler::new(config)?;

    let (width, height) = source.dimensions();
    info!(width, height, fps = source.frame_rate(), "starting video");

    let mut report = VideoReport::default();
    while let Some(frame) = source.next_frame()? {
        let index = report.frames;
        report.frames += 1;

        let out = match scrambler.scramble_face(&frame, detector) {
            Ok(out) => {
                report.scrambled += 1;
                out
            }
            Err(e) => {
                warn!(frame = index, error = %e, "passing frame through unscrambled");
                report.passed_through += 1;
                frame
            }
        };

        if let Some(sink) = sink.as_mut() {
            sink.write_frame(&out)?;
        }
    }

    if let Some(sink) = sink.as_mut() {
        sink.finish()?;
    }
    info!(
        frames = report.frames,
        scrambled = report.scrambled,
        passed_through = report.passed_through,
        "video finished"
    );
    Ok(report)
}
