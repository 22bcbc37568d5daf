//! File-backed frame I/O through libav.

use std::path::Path;

use ffmpeg_next as ffmpeg;
use ffmpeg::format::{self, Pixel};
use ffmpeg::media::Type;
use ffmpeg::software::scaling::{Context as Scaler, Flags};
use ffmpeg::util::frame::video::Video;
use ffmpeg::{Packet, Rational, codec, decoder, encoder};
use image::RgbImage;
use tracing::debug;

use super::{FrameSink, FrameSource};
use crate::error::{Result, ScrambleError};

/// Used when a stream does not declare its frame rate.
const FALLBACK_FPS: f64 = 25.0;

fn video_error(e: ffmpeg::Error) -> ScrambleError {
    ScrambleError::Video(e.to_string())
}

fn frame_to_image(frame: &Video) -> Result<RgbImage> {
    let (width, height) = (frame.width(), frame.height());
    let stride = frame.stride(0);
    let data = frame.data(0);
    let row = width as usize * 3;

    let mut bytes = Vec::with_capacity(row * height as usize);
    for y in 0..height as usize {
        bytes.extend_from_slice(&data[y * stride..y * stride + row]);
    }
    RgbImage::from_raw(width, height, bytes)
        .ok_or_else(|| ScrambleError::Video("decoded frame is truncated".into()))
}

fn image_to_frame(image: &RgbImage) -> Video {
    let (width, height) = image.dimensions();
    let mut frame = Video::new(Pixel::RGB24, width, height);
    let stride = frame.stride(0);
    let row = width as usize * 3;
    let data = frame.data_mut(0);
    for (y, src) in image.as_raw().chunks_exact(row).enumerate() {
        data[y * stride..y * stride + row].copy_from_slice(src);
    }
    frame
}

/// Decodes the best video stream of a container into RGB frames.
pub struct FfmpegSource {
    input: format::context::Input,
    stream_index: usize,
    decoder: decoder::Video,
    scaler: Scaler,
    frame_rate: f64,
    eof_sent: bool,
}

impl FfmpegSource {
    pub fn open(path: &Path) -> Result<Self> {
        ffmpeg::init().map_err(video_error)?;
        let input = format::input(&path).map_err(video_error)?;

        let (stream_index, frame_rate, parameters) = {
            let stream = input
                .streams()
                .best(Type::Video)
                .ok_or_else(|| ScrambleError::Video(format!("{} has no video stream", path.display())))?;
            let rate = stream.avg_frame_rate();
            let fps = if rate.numerator() > 0 && rate.denominator() > 0 {
                f64::from(rate)
            } else {
                FALLBACK_FPS
            };
            (stream.index(), fps, stream.parameters())
        };

        let decoder = codec::context::Context::from_parameters(parameters)
            .map_err(video_error)?
            .decoder()
            .video()
            .map_err(video_error)?;
        let scaler = Scaler::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            Flags::BILINEAR,
        )
        .map_err(video_error)?;
        debug!(
            width = decoder.width(),
            height = decoder.height(),
            fps = frame_rate,
            "opened video input"
        );

        Ok(Self {
            input,
            stream_index,
            decoder,
            scaler,
            frame_rate,
            eof_sent: false,
        })
    }

    fn receive(&mut self) -> Result<Option<RgbImage>> {
        let mut decoded = Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let mut rgb = Video::empty();
        self.scaler.run(&decoded, &mut rgb).map_err(video_error)?;
        frame_to_image(&rgb).map(Some)
    }
}

impl FrameSource for FfmpegSource {
    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.decoder.width(), self.decoder.height())
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        loop {
            if let Some(image) = self.receive()? {
                return Ok(Some(image));
            }
            if self.eof_sent {
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() == self.stream_index {
                        self.decoder.send_packet(&packet).map_err(video_error)?;
                    }
                }
                Err(ffmpeg::Error::Eof) => {
                    self.decoder.send_eof().map_err(video_error)?;
                    self.eof_sent = true;
                }
                Err(e) => return Err(video_error(e)),
            }
        }
    }
}

/// Encodes RGB frames as MPEG-4 video.
pub struct FfmpegSink {
    output: format::context::Output,
    encoder: encoder::video::Encoder,
    scaler: Scaler,
    stream_index: usize,
    time_base: Rational,
    stream_time_base: Rational,
    dimensions: (u32, u32),
    next_pts: i64,
}

impl FfmpegSink {
    /// Creates `path` for `width` x `height` frames at `frame_rate`.
    pub fn create(path: &Path, width: u32, height: u32, frame_rate: f64) -> Result<Self> {
        ffmpeg::init().map_err(video_error)?;
        let mut output = format::output(&path).map_err(video_error)?;
        let codec = encoder::find(codec::Id::MPEG4)
            .ok_or_else(|| ScrambleError::Video("MPEG-4 encoder unavailable".into()))?;
        let global_header = output.format().flags().contains(format::Flags::GLOBAL_HEADER);

        let fps = Rational::from(frame_rate);
        let time_base = fps.invert();

        let mut video = codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(video_error)?;
        video.set_width(width);
        video.set_height(height);
        video.set_format(Pixel::YUV420P);
        video.set_time_base(time_base);
        video.set_frame_rate(Some(fps));
        if global_header {
            video.set_flags(codec::Flags::GLOBAL_HEADER);
        }
        let encoder = video.open_as(codec).map_err(video_error)?;

        let stream_index = {
            let mut stream = output.add_stream(codec).map_err(video_error)?;
            stream.set_time_base(time_base);
            stream.set_parameters(&encoder);
            stream.index()
        };
        output.write_header().map_err(video_error)?;
        let stream_time_base = output
            .stream(stream_index)
            .map(|s| s.time_base())
            .ok_or_else(|| ScrambleError::Video("output stream vanished".into()))?;

        let scaler = Scaler::get(
            Pixel::RGB24,
            width,
            height,
            Pixel::YUV420P,
            width,
            height,
            Flags::BILINEAR,
        )
        .map_err(video_error)?;
        debug!(width, height, fps = frame_rate, path = %path.display(), "opened video output");

        Ok(Self {
            output,
            encoder,
            scaler,
            stream_index,
            time_base,
            stream_time_base,
            dimensions: (width, height),
            next_pts: 0,
        })
    }

    fn drain(&mut self) -> Result<()> {
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.time_base, self.stream_time_base);
            packet.write_interleaved(&mut self.output).map_err(video_error)?;
        }
        Ok(())
    }
}

impl FrameSink for FfmpegSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        if frame.dimensions() != self.dimensions {
            return Err(ScrambleError::Video(format!(
                "frame is {:?}, stream is {:?}",
                frame.dimensions(),
                self.dimensions
            )));
        }
        let rgb = image_to_frame(frame);
        let mut yuv = Video::empty();
        self.scaler.run(&rgb, &mut yuv).map_err(video_error)?;
        yuv.set_pts(Some(self.next_pts));
        self.next_pts += 1;

        self.encoder.send_frame(&yuv).map_err(video_error)?;
        self.drain()
    }

    fn finish(&mut self) -> Result<()> {
        self.encoder.send_eof().map_err(video_error)?;
        self.drain()?;
        self.output.write_trailer().map_err(video_error)
    }
}
