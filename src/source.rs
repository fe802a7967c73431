//! Decoding side of the extraction loop.
//!
//! [`FrameSource`] is what [`FrameExtractor`](crate::FrameExtractor) pulls
//! frames from. [`VideoSource`] implements it on top of FFmpeg: it seeks
//! the container to the keyframe at or before the requested position and
//! decodes forward until it reaches a frame at or after that position.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
    util::error::EAGAIN,
};
use image::{DynamicImage, RgbImage};

use crate::{
    conversion::{StreamClock, frame_to_rgb_buffer, rate_to_frames_per_second},
    error::FrameExtractError,
    metadata::VideoMetadata,
};

/// A decoded frame together with its presentation time.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// Presentation timestamp of the frame, measured from the start of the
    /// video.
    pub timestamp: Duration,
    /// The frame as an RGB image.
    pub image: DynamicImage,
}

/// A seekable supply of decoded frames.
///
/// `decode` distinguishes a clean end of stream (`Ok(None)`) from a decoder
/// failure (`Err`). The extraction loop stops on either, but reports them
/// differently.
pub trait FrameSource {
    /// Whether the source can still produce frames.
    fn is_open(&self) -> bool;

    /// Position the source so the next [`decode`](FrameSource::decode)
    /// returns the first frame at or after `position`.
    fn seek(&mut self, position: Duration) -> Result<(), FrameExtractError>;

    /// Decode the first frame at or after the last requested position.
    fn decode(&mut self) -> Result<Option<DecodedFrame>, FrameExtractError>;

    /// Total stream duration, if known. Used for progress estimates only.
    fn duration(&self) -> Option<Duration> {
        None
    }
}

/// An opened video file.
///
/// Owns the FFmpeg demuxer, decoder and RGB scaler for the best video
/// stream of the file. All of them are freed when the source is dropped;
/// [`release`](VideoSource::release) does the same explicitly.
pub struct VideoSource {
    input_context: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    stream_index: usize,
    clock: StreamClock,
    metadata: VideoMetadata,
    /// Position requested by the last seek.
    target: Duration,
    /// Set when the last seek was beyond the known duration.
    past_end: bool,
    /// Cleared once the decoder has failed.
    open: bool,
    path: PathBuf,
}

impl Debug for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoSource")
            .field("path", &self.path)
            .field("metadata", &self.metadata)
            .field("target", &self.target)
            .field("open", &self.open)
            .finish_non_exhaustive()
    }
}

impl VideoSource {
    /// Open a video file.
    ///
    /// Initialises FFmpeg (idempotent), selects the best video stream and
    /// prepares a decoder that produces RGB8 frames at source resolution.
    ///
    /// # Errors
    ///
    /// - [`FrameExtractError::FileOpen`] if the file cannot be opened or its
    ///   video stream cannot be decoded.
    /// - [`FrameExtractError::NoVideoStream`] if the file has no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FrameExtractError> {
        let path = path.as_ref().to_path_buf();

        log::debug!("Opening video source: {}", path.display());

        let open_error = |reason: String| FrameExtractError::FileOpen {
            path: path.clone(),
            reason,
        };

        ffmpeg_next::init()
            .map_err(|error| open_error(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| open_error(error.to_string()))?;

        let (stream_index, clock, frames_per_second, decoder) = {
            let stream = input_context
                .streams()
                .best(Type::Video)
                .ok_or(FrameExtractError::NoVideoStream)?;

            let mut frames_per_second = rate_to_frames_per_second(stream.avg_frame_rate());
            if frames_per_second <= 0.0 {
                frames_per_second = rate_to_frames_per_second(stream.rate());
            }

            let decoder = CodecContext::from_parameters(stream.parameters())
                .and_then(|context| context.decoder().video())
                .map_err(|error| {
                    open_error(format!(
                        "Failed to create video decoder for stream {}: {error}",
                        stream.index()
                    ))
                })?;

            let clock = StreamClock::new(stream.time_base(), stream.start_time());

            (stream.index(), clock, frames_per_second, decoder)
        };

        let scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ScalingFlags::BILINEAR,
        )?;

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            duration,
            start_time: clock.start_time(),
            codec,
            stream_index,
        };

        log::info!(
            "Opened video source: {} ({}x{}, {:.2} fps, duration={:.2}s, start={:.3}s, codec={})",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.duration.as_secs_f64(),
            metadata.start_time.as_secs_f64(),
            metadata.codec,
        );

        Ok(Self {
            input_context,
            decoder,
            scaler,
            stream_index,
            clock,
            metadata,
            target: Duration::ZERO,
            past_end: false,
            open: true,
            path,
        })
    }

    /// Metadata of the selected video stream.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the decoder and demuxer.
    pub fn release(self) {
        log::debug!("Releasing video source: {}", self.path.display());
    }

    fn decode_at_target(&mut self) -> Result<Option<DecodedFrame>, FrameExtractError> {
        let mut decoded_frame = VideoFrame::empty();

        for (stream, packet) in self.input_context.packets() {
            if stream.index() != self.stream_index {
                continue;
            }

            self.decoder
                .send_packet(&packet)
                .map_err(|error| FrameExtractError::VideoDecodeError(error.to_string()))?;

            if let Some(frame) = receive_reached(
                &mut self.decoder,
                &mut self.scaler,
                &mut decoded_frame,
                self.clock,
                self.target,
            )? {
                return Ok(Some(frame));
            }
        }

        // Drain what the decoder still holds. It may already be draining if
        // decode is called twice without a seek in between.
        match self.decoder.send_eof() {
            Ok(()) | Err(FfmpegError::Eof) => {}
            Err(error) => return Err(FrameExtractError::VideoDecodeError(error.to_string())),
        }
        receive_reached(
            &mut self.decoder,
            &mut self.scaler,
            &mut decoded_frame,
            self.clock,
            self.target,
        )
    }
}

impl FrameSource for VideoSource {
    fn is_open(&self) -> bool {
        self.open
    }

    fn seek(&mut self, position: Duration) -> Result<(), FrameExtractError> {
        self.target = position;

        if !self.metadata.duration.is_zero() && position > self.metadata.duration {
            log::debug!(
                "Seek to {:.3}s is past the end ({:.3}s)",
                position.as_secs_f64(),
                self.metadata.duration.as_secs_f64(),
            );
            self.past_end = true;
            return Ok(());
        }
        self.past_end = false;

        let timestamp = self.clock.seek_timestamp(position);
        self.input_context.seek(timestamp, ..timestamp)?;
        self.decoder.flush();

        log::debug!("Seeked to {:.3}s", position.as_secs_f64());
        Ok(())
    }

    fn decode(&mut self) -> Result<Option<DecodedFrame>, FrameExtractError> {
        if !self.open {
            return Err(FrameExtractError::VideoDecodeError(
                "decoder is closed after an earlier failure".to_string(),
            ));
        }
        if self.past_end {
            return Ok(None);
        }

        let result = self.decode_at_target();
        if result.is_err() {
            self.open = false;
        }
        result
    }

    fn duration(&self) -> Option<Duration> {
        if self.metadata.duration.is_zero() {
            None
        } else {
            Some(self.metadata.duration)
        }
    }
}

/// Pull frames out of the decoder until one at or after `target` turns up.
///
/// `Ok(None)` means the decoder needs more input or is fully drained.
fn receive_reached(
    decoder: &mut VideoDecoder,
    scaler: &mut ScalingContext,
    decoded_frame: &mut VideoFrame,
    clock: StreamClock,
    target: Duration,
) -> Result<Option<DecodedFrame>, FrameExtractError> {
    while frame_ready(decoder.receive_frame(decoded_frame))? {
        if let Some(frame) = convert_if_reached(scaler, decoded_frame, clock, target)? {
            return Ok(Some(frame));
        }
    }
    Ok(None)
}

/// Classify the result of `receive_frame`.
///
/// `EAGAIN` and end of stream are the decoder's way of saying it has
/// nothing more for now. Anything else is corrupt input reported late,
/// which frame-threaded decoders do.
fn frame_ready(received: Result<(), FfmpegError>) -> Result<bool, FrameExtractError> {
    match received {
        Ok(()) => Ok(true),
        Err(FfmpegError::Other { errno: EAGAIN }) | Err(FfmpegError::Eof) => Ok(false),
        Err(error) => Err(FrameExtractError::VideoDecodeError(error.to_string())),
    }
}

/// Convert `frame` to RGB if it is at or after `target`.
fn convert_if_reached(
    scaler: &mut ScalingContext,
    frame: &VideoFrame,
    clock: StreamClock,
    target: Duration,
) -> Result<Option<DecodedFrame>, FrameExtractError> {
    let timestamp = match frame.timestamp().or_else(|| frame.pts()) {
        Some(pts) => clock.position(pts),
        None => target,
    };
    if timestamp < target {
        return Ok(None);
    }

    let mut rgb_frame = VideoFrame::empty();
    scaler.run(frame, &mut rgb_frame)?;

    let width = rgb_frame.width();
    let height = rgb_frame.height();
    let buffer = frame_to_rgb_buffer(&rgb_frame, width, height);
    let image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        FrameExtractError::VideoDecodeError(
            "Failed to construct RGB image from decoded frame data".to_string(),
        )
    })?;

    Ok(Some(DecodedFrame {
        timestamp,
        image: DynamicImage::ImageRgb8(image),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoded_frame_is_ready() {
        assert!(frame_ready(Ok(())).unwrap());
    }

    #[test]
    fn again_and_end_of_stream_mean_no_frame() {
        assert!(!frame_ready(Err(FfmpegError::Other { errno: EAGAIN })).unwrap());
        assert!(!frame_ready(Err(FfmpegError::Eof)).unwrap());
    }

    #[test]
    fn late_decoder_errors_are_reported() {
        let error = frame_ready(Err(FfmpegError::InvalidData)).unwrap_err();
        assert!(matches!(error, FrameExtractError::VideoDecodeError(_)));
    }
}
